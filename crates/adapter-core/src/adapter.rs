//! The adapter capability set.

use async_trait::async_trait;
use engine::StrategyCtx;
use model::{Balances, MarketId, OpenOrders, Order, OrderBook, OrderSide, Positions};
use rust_decimal::Decimal;

use crate::error::AdapterError;
use crate::extractor::TypedExtractor;

/// Order side from a signed amount: positive buys, negative sells.
///
/// This is the documented convention everywhere an order amount appears;
/// adapters must not carry a separate side field that can disagree with
/// the sign.
pub fn side_of(amount: Decimal) -> Option<OrderSide> {
    if amount > Decimal::ZERO {
        Some(OrderSide::Buy)
    } else if amount < Decimal::ZERO {
        Some(OrderSide::Sell)
    } else {
        None
    }
}

/// Capabilities an exchange adapter provides to strategies.
///
/// `subscribe_*` operations are synchronous: they register with the
/// strategy's router (idempotently) and ask the host to poll. Order
/// operations go through the engine's send helper and therefore suspend
/// the calling strategy until the exchange answers.
///
/// `subscribe_position` is optional; spot-only venues leave the default,
/// which reports the capability as unsupported.
#[async_trait(?Send)]
pub trait ExchangeAdapter {
    /// The adapter's name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Polls the order book of `market`.
    fn subscribe_orderbook(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
    ) -> Result<TypedExtractor<OrderBook>, AdapterError>;

    /// Polls the account balances behind `market`'s credential
    /// environment.
    fn subscribe_balance(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
    ) -> Result<TypedExtractor<Balances>, AdapterError>;

    /// Polls signed net positions. Only meaningful for swap markets.
    fn subscribe_position(
        &self,
        _ctx: &StrategyCtx,
        _market: &MarketId,
    ) -> Result<TypedExtractor<Positions>, AdapterError> {
        Err(AdapterError::Unsupported("subscribe_position"))
    }

    /// Polls the strategy's open orders on `market`.
    fn subscribe_orders(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
    ) -> Result<TypedExtractor<OpenOrders>, AdapterError>;

    /// Places a limit order; `amount` is signed (positive = buy).
    async fn limit_order(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
        price: Decimal,
        amount: Decimal,
    ) -> Result<Order, AdapterError>;

    /// Places a market order; `amount` is signed (positive = buy).
    async fn market_order(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
        amount: Decimal,
    ) -> Result<Order, AdapterError>;

    /// Cancels one open order by exchange order id.
    async fn cancel_order(
        &self,
        ctx: &StrategyCtx,
        market: &MarketId,
        order_id: &str,
    ) -> Result<(), AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::sim::SimHost;
    use engine::{exit, EngineError, Executor, ExecutorConfig, ParseError, StrategyRegistry};
    use host_core::{Host, Interrupt, RequestPayload, ResponsePayload};
    use model::Snapshot;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// A minimal adapter against a JSON wire format, exercising the full
    /// capability surface end to end.
    struct TestExchange {
        base: &'static str,
    }

    fn parse_book(payload: &ResponsePayload) -> Result<Snapshot, ParseError> {
        let value: Value = serde_json::from_str(&payload.content)?;
        let levels = |side: &str| -> Result<Vec<(Decimal, Decimal)>, ParseError> {
            value[side]
                .as_array()
                .ok_or_else(|| ParseError(format!("missing '{side}'")))?
                .iter()
                .map(|level| {
                    let price = level[0]
                        .as_str()
                        .ok_or_else(|| ParseError("price is not a string".into()))?;
                    let quantity = level[1]
                        .as_str()
                        .ok_or_else(|| ParseError("quantity is not a string".into()))?;
                    Ok((
                        price.parse().map_err(|_| ParseError("bad price".into()))?,
                        quantity
                            .parse()
                            .map_err(|_| ParseError("bad quantity".into()))?,
                    ))
                })
                .collect()
        };
        Ok(Snapshot::OrderBook(OrderBook::new(
            levels("bids")?,
            levels("asks")?,
        )))
    }

    fn parse_orders(payload: &ResponsePayload) -> Result<Snapshot, ParseError> {
        let value: Value = serde_json::from_str(&payload.content)?;
        let orders = value
            .as_array()
            .ok_or_else(|| ParseError("orders payload is not an array".into()))?
            .iter()
            .map(|order| {
                let id = order["id"]
                    .as_str()
                    .ok_or_else(|| ParseError("order without id".into()))?;
                let amount: Decimal = order["amount"]
                    .as_str()
                    .and_then(|raw| raw.parse().ok())
                    .ok_or_else(|| ParseError("order without amount".into()))?;
                Ok(Order::new(id, None, amount))
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Snapshot::Orders(OpenOrders::new(orders)))
    }

    #[async_trait(?Send)]
    impl ExchangeAdapter for TestExchange {
        fn name(&self) -> &str {
            "test-exchange"
        }

        fn subscribe_orderbook(
            &self,
            ctx: &StrategyCtx,
            market: &MarketId,
        ) -> Result<TypedExtractor<OrderBook>, AdapterError> {
            let url = format!("{}/depth?pair={}", self.base, market.pair());
            let inner = ctx.register(
                RequestPayload::get(url),
                Duration::from_millis(100),
                parse_book,
            );
            Ok(TypedExtractor::order_book(inner))
        }

        fn subscribe_balance(
            &self,
            _ctx: &StrategyCtx,
            _market: &MarketId,
        ) -> Result<TypedExtractor<Balances>, AdapterError> {
            Err(AdapterError::Unsupported("subscribe_balance"))
        }

        fn subscribe_orders(
            &self,
            ctx: &StrategyCtx,
            market: &MarketId,
        ) -> Result<TypedExtractor<OpenOrders>, AdapterError> {
            let url = format!("{}/orders?pair={}", self.base, market.pair());
            let inner = ctx.register(
                RequestPayload::get(url),
                Duration::from_millis(200),
                parse_orders,
            );
            Ok(TypedExtractor::orders(inner))
        }

        async fn limit_order(
            &self,
            ctx: &StrategyCtx,
            market: &MarketId,
            price: Decimal,
            amount: Decimal,
        ) -> Result<Order, AdapterError> {
            side_of(amount).ok_or(AdapterError::Exchange("zero amount".into()))?;
            let body = serde_json::json!({
                "pair": market.pair(),
                "price": price.to_string(),
                "amount": amount.to_string(),
            });
            let response = ctx
                .send_json(RequestPayload::post(
                    format!("{}/order", self.base),
                    body.to_string(),
                ))
                .await?;
            let id = response["id"]
                .as_str()
                .ok_or_else(|| AdapterError::Decode("order ack without id".into()))?;
            Ok(Order::new(id, Some(price), amount))
        }

        async fn market_order(
            &self,
            ctx: &StrategyCtx,
            market: &MarketId,
            amount: Decimal,
        ) -> Result<Order, AdapterError> {
            side_of(amount).ok_or(AdapterError::Exchange("zero amount".into()))?;
            let body = serde_json::json!({
                "pair": market.pair(),
                "amount": amount.to_string(),
            });
            let response = ctx
                .send_json(RequestPayload::post(
                    format!("{}/order", self.base),
                    body.to_string(),
                ))
                .await?;
            let id = response["id"]
                .as_str()
                .ok_or_else(|| AdapterError::Decode("order ack without id".into()))?;
            Ok(Order::new(id, None, amount))
        }

        async fn cancel_order(
            &self,
            ctx: &StrategyCtx,
            _market: &MarketId,
            order_id: &str,
        ) -> Result<(), AdapterError> {
            ctx.send(RequestPayload {
                url: format!("{}/order/{}", self.base, order_id),
                method: host_core::Method::Delete,
                body: None,
                headers: None,
                sign: None,
                env_suffix: None,
                primary_only: false,
            })
            .await?;
            Ok(())
        }
    }

    #[test]
    fn test_side_of_signed_amount() {
        assert_eq!(side_of(dec!(1)), Some(OrderSide::Buy));
        assert_eq!(side_of(dec!(-0.25)), Some(OrderSide::Sell));
        assert_eq!(side_of(dec!(0)), None);
    }

    #[tokio::test]
    async fn test_adapter_round_trip_through_the_engine() {
        let host = SimHost::new();
        let placed: Rc<RefCell<Option<Order>>> = Rc::new(RefCell::new(None));
        let best_bid: Rc<RefCell<Option<Decimal>>> = Rc::new(RefCell::new(None));

        let mut registry = StrategyRegistry::new();
        {
            let placed = Rc::clone(&placed);
            let best_bid = Rc::clone(&best_bid);
            registry.register("maker", move |ctx| {
                let placed = Rc::clone(&placed);
                let best_bid = Rc::clone(&best_bid);
                async move {
                    let adapter = TestExchange {
                        base: "https://sim.test",
                    };
                    let market: MarketId =
                        "spot:BTC/USDT".parse().map_err(AdapterError::Market)?;
                    let book = adapter.subscribe_orderbook(&ctx, &market)?;

                    let loop_ctx = ctx.clone();
                    ctx.on(move |tick| {
                        let placed = Rc::clone(&placed);
                        let best_bid = Rc::clone(&best_bid);
                        let book = book.clone();
                        let ctx = loop_ctx.clone();
                        async move {
                            let snapshot = book
                                .get(&tick.results)
                                .ok_or_else(|| EngineError::Callback("no book".into()))?;
                            let bid = snapshot
                                .best_bid()
                                .ok_or_else(|| EngineError::Callback("empty book".into()))?;
                            *best_bid.borrow_mut() = Some(bid.price);

                            let adapter = TestExchange {
                                base: "https://sim.test",
                            };
                            let market: MarketId = "spot:BTC/USDT"
                                .parse()
                                .map_err(AdapterError::Market)?;
                            let order = adapter
                                .limit_order(&ctx, &market, bid.price, dec!(0.5))
                                .await?;
                            *placed.borrow_mut() = Some(order);
                            Err(exit())
                        }
                    })
                    .await
                }
            });
        }

        host.push_fetcher(
            "https://sim.test/depth?pair=BTC/USDT",
            r#"{"bids":[["100","1"],["99","2"]],"asks":[["101","1"]]}"#,
        );
        host.push_send_response(
            1,
            ResponsePayload::from_http("https://sim.test/order", None, 200, r#"{"id":"ord-1"}"#),
        );
        host.push_signal(Interrupt::Terminate);

        let mut executor = Executor::with_config(
            Rc::clone(&host) as Rc<dyn Host>,
            registry,
            metrics::create_metrics(),
            ExecutorConfig {
                restart_throttle: Duration::ZERO,
                ..Default::default()
            },
        );
        executor.run().await.unwrap();

        assert_eq!(*best_bid.borrow(), Some(dec!(100)));
        let order = placed.borrow_mut().take().expect("order placed");
        assert_eq!(order.id, "ord-1");
        assert_eq!(order.amount, dec!(0.5));
        assert_eq!(order.side(), Some(OrderSide::Buy));

        // The subscribe went to the host; the order went through send.
        assert_eq!(host.subscriptions().len(), 1);
        assert_eq!(host.sent_requests().len(), 1);
        assert_eq!(host.sent_requests()[0].url, "https://sim.test/order");
    }
}

//! Scripted quote provider and builders for the async tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use router_core::{Amount, Token, TokenAddress, TradeType};
use routing::{Pool, Route, SliceQuote};

use crate::provider::QuoteProvider;

pub(crate) fn token(n: u8) -> Token {
    let address = TokenAddress::parse(&format!("0x{:040x}", n)).unwrap();
    Token::new(address, 18).with_symbol(format!("T{}", n))
}

pub(crate) fn v3_pool(id: &str, a: &Token, b: &Token) -> Pool {
    Pool::new_v3(id, a.clone(), b.clone(), 500, 1_000_000).unwrap()
}

pub(crate) fn v2_pool(id: &str, a: &Token, b: &Token) -> Pool {
    Pool::new_v2(id, a.clone(), b.clone(), 1_000_000, 1_000_000).unwrap()
}

/// How the mock answers for one route key
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// `amount * rate_bps / 10_000`, shrunk by `depth / (depth + amount)`
    Curve { rate_bps: Amount, depth: Amount },
    /// Exactly this ladder, whatever the amounts
    Ladder(Vec<Option<Amount>>),
    Fail(&'static str),
    Panic,
    Hang,
}

pub(crate) struct MockProvider {
    scripts: HashMap<String, Script>,
    fallback: Option<Script>,
    delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, route_key: &str, script: Script) -> Self {
        self.scripts.insert(route_key.to_string(), script);
        self
    }

    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(script: &Script, amounts: &[Amount]) -> Vec<Option<SliceQuote>> {
        match script {
            Script::Curve { rate_bps, depth } => amounts
                .iter()
                .map(|&a| {
                    let gross = a * rate_bps / 10_000;
                    Some(SliceQuote::new(gross * depth / (depth + a)))
                })
                .collect(),
            Script::Ladder(ladder) => ladder.iter().map(|q| q.map(SliceQuote::new)).collect(),
            Script::Fail(_) | Script::Panic | Script::Hang => Vec::new(),
        }
    }
}

impl QuoteProvider for MockProvider {
    async fn quote_route(
        &self,
        route: &Route,
        amounts: &[Amount],
        _trade_type: TradeType,
    ) -> anyhow::Result<Vec<Option<SliceQuote>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let script = self
            .scripts
            .get(&route.key())
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or(Script::Fail("no script"));

        let result = match script {
            Script::Fail(message) => Err(anyhow::anyhow!(message)),
            Script::Panic => panic!("scripted panic"),
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            other => Ok(Self::answer(&other, amounts)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

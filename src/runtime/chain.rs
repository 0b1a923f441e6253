use std::sync::Arc;

use super::join_point::JoinPoint;
use super::objects::MethodBody;
use super::proxy::ProxyObject;
use super::{ArgVec, InvocationResult};

/// Code run for an advice
///
/// Around advice returns the value the call should produce, usually the result of
/// [`JoinPoint::proceed`]; the return value of other kinds is ignored. Closures of the right
/// shape implement this trait.
pub trait AdviceHandler: Send + Sync {
    fn invoke(&self, join_point: &mut JoinPoint<'_>) -> InvocationResult;
}

impl<F> AdviceHandler for F
where
    F: Fn(&mut JoinPoint<'_>) -> InvocationResult + Send + Sync,
{
    fn invoke(&self, join_point: &mut JoinPoint<'_>) -> InvocationResult {
        self(join_point)
    }
}

/// Around advice of one invocation, with a cursor that only moves forward
///
/// Once the advice is exhausted, the next `proceed` runs the method body. The body runs at most
/// once; later calls get its cached outcome.
pub struct AdviceChain<'a> {
    advices: &'a [Arc<dyn AdviceHandler>],
    cursor: usize,
    body: &'a dyn MethodBody,
    outcome: Option<InvocationResult>,
}

impl<'a> AdviceChain<'a> {
    pub fn new(advices: &'a [Arc<dyn AdviceHandler>], body: &'a dyn MethodBody) -> Self {
        AdviceChain {
            advices,
            cursor: 0,
            body,
            outcome: None,
        }
    }

    /// Next around advice, moving the cursor past it
    pub(crate) fn advance(&mut self) -> Option<&'a Arc<dyn AdviceHandler>> {
        let next = self.advices.get(self.cursor)?;
        self.cursor += 1;
        Some(next)
    }

    /// Run the body, or replay its outcome if it already ran
    pub(crate) fn invoke_body(
        &mut self,
        proxy: &ProxyObject,
        arguments: &ArgVec,
    ) -> InvocationResult {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let outcome = self.body.call(proxy, arguments);
        self.outcome = Some(outcome.clone());
        outcome
    }
}

//! Predicates deciding whether an event occurrence satisfies a wait
//!
//! A predicate is judged once per occurrence, in arrival order, and never
//! concurrently with itself within one wait. Synchronous, asynchronous and
//! fallible predicates all go through the same [`Predicate`] trait; the
//! constructors in this module cover the common shapes.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::PredicateError;

/// Filter applied to each occurrence of the awaited event
#[async_trait]
pub trait Predicate: Send + Sync {
    /// Whether `payload` satisfies the wait
    ///
    /// An `Err` ends the wait with a predicate failure.
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError>;
}

#[async_trait]
impl<P: Predicate + ?Sized> Predicate for Box<P> {
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        (**self).check(payload).await
    }
}

/// Synchronous, infallible predicate
pub struct FromFn<F>(F);

/// Wrap a synchronous closure
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    FromFn(f)
}

#[async_trait]
impl<F> Predicate for FromFn<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        Ok((self.0)(payload))
    }
}

/// Synchronous predicate that may fail
pub struct TryFromFn<F>(F);

/// Wrap a synchronous closure returning a `Result`
pub fn try_from_fn<F, E>(f: F) -> TryFromFn<F>
where
    F: Fn(&Value) -> Result<bool, E> + Send + Sync,
    E: Into<PredicateError> + 'static,
{
    TryFromFn(f)
}

#[async_trait]
impl<F, E> Predicate for TryFromFn<F>
where
    F: Fn(&Value) -> Result<bool, E> + Send + Sync,
    E: Into<PredicateError> + 'static,
{
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        (self.0)(payload).map_err(Into::into)
    }
}

/// Asynchronous predicate
///
/// The closure receives its own copy of the payload so the returned future
/// does not borrow from the bus.
pub struct FromAsyncFn<F>(F);

/// Wrap a closure returning a future
pub fn from_async_fn<F, Fut, E>(f: F) -> FromAsyncFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, E>> + Send + 'static,
    E: Into<PredicateError> + 'static,
{
    FromAsyncFn(f)
}

#[async_trait]
impl<F, Fut, E> Predicate for FromAsyncFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, E>> + Send + 'static,
    E: Into<PredicateError> + 'static,
{
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        (self.0)(payload.clone()).await.map_err(Into::into)
    }
}

/// Equality on the value at a JSON pointer
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    pointer: String,
    expected: Value,
}

/// Match payloads whose value at `pointer` equals `expected`
///
/// A missing field never matches.
pub fn field_equals(pointer: impl Into<String>, expected: impl Into<Value>) -> FieldEquals {
    FieldEquals {
        pointer: pointer.into(),
        expected: expected.into(),
    }
}

impl FieldEquals {
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }
}

#[async_trait]
impl Predicate for FieldEquals {
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        Ok(payload.pointer(&self.pointer) == Some(&self.expected))
    }
}

/// Conjunction of predicates, judged in order
pub struct AllOf(Vec<Box<dyn Predicate>>);

/// Match when every predicate matches; an empty list matches everything
///
/// Stops at the first `false` or error.
pub fn all_of(predicates: Vec<Box<dyn Predicate>>) -> AllOf {
    AllOf(predicates)
}

#[async_trait]
impl Predicate for AllOf {
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        for predicate in &self.0 {
            if !predicate.check(payload).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Predicate over a typed payload
pub struct Decoded<T, F> {
    f: F,
    _payload: PhantomData<fn() -> T>,
}

/// Deserialize each payload into `T` before judging it
///
/// A payload that does not decode fails the wait.
pub fn decoded<T, F>(f: F) -> Decoded<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(&T) -> bool + Send + Sync,
{
    Decoded {
        f,
        _payload: PhantomData,
    }
}

#[async_trait]
impl<T, F> Predicate for Decoded<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(&T) -> bool + Send + Sync,
{
    async fn check(&self, payload: &Value) -> Result<bool, PredicateError> {
        let decoded: T = serde_json::from_value(payload.clone())?;
        Ok((self.f)(&decoded))
    }
}

use std::fmt;
use std::sync::{Arc, OnceLock};

use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;

use crate::value::{Value, ValueError};

pub type DeferredResult<T> = Result<T, DeferredError>;

type Thunk<T> = dyn Fn() -> DeferredResult<T> + Send + Sync;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeferredError {
    #[error("deferred value '{0}' was resolved before the action producing it ran")]
    Unbound(String),
    #[error("slot '{0}' was bound twice")]
    AlreadyBound(String),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("numeric overflow in {0}")]
    Overflow(&'static str),
    #[error("division by zero in {0}")]
    DivideByZero(&'static str),
}

/// A value that becomes available once some earlier action has executed.
///
/// Resolution is pull-based and side-effect free: every operator builds a new
/// node whose thunk resolves its operands and applies the operator. Cloning is
/// cheap and shares the underlying node.
pub struct Deferred<T> {
    thunk: Arc<Thunk<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// Write-once setter paired with a slot-bound [`Deferred`].
pub struct Slot<T> {
    label: Arc<str>,
    cell: Arc<OnceLock<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("label", &self.label)
            .field("filled", &self.cell.get().is_some())
            .finish()
    }
}

impl<T> Slot<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn fill(&self, value: T) -> DeferredResult<()> {
        self.cell
            .set(value)
            .map_err(|_| DeferredError::AlreadyBound(self.label.to_string()))
    }
}

impl<T: Send + Sync + 'static> Deferred<T> {
    pub fn from_fn(f: impl Fn() -> DeferredResult<T> + Send + Sync + 'static) -> Self {
        Self { thunk: Arc::new(f) }
    }

    pub fn resolve(&self) -> DeferredResult<T> {
        (self.thunk)()
    }

    pub fn map<U: Send + Sync + 'static>(
        &self,
        f: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> Deferred<U> {
        let upstream = self.clone();
        Deferred::from_fn(move || upstream.resolve().map(&f))
    }

    pub fn try_map<U: Send + Sync + 'static>(
        &self,
        f: impl Fn(T) -> DeferredResult<U> + Send + Sync + 'static,
    ) -> Deferred<U> {
        let upstream = self.clone();
        Deferred::from_fn(move || f(upstream.resolve()?))
    }

    /// Like [`Deferred::map`] but flattens a deferred produced by `f`.
    pub fn flat_map<U: Send + Sync + 'static>(
        &self,
        f: impl Fn(T) -> Deferred<U> + Send + Sync + 'static,
    ) -> Deferred<U> {
        let upstream = self.clone();
        Deferred::from_fn(move || f(upstream.resolve()?).resolve())
    }

    pub fn zip<U: Send + Sync + 'static>(&self, other: &Deferred<U>) -> Deferred<(T, U)> {
        let left = self.clone();
        let right = other.clone();
        Deferred::from_fn(move || Ok((left.resolve()?, right.resolve()?)))
    }

    /// Resolves every input in order; the first failure wins.
    pub fn join(values: impl IntoIterator<Item = Deferred<T>>) -> Deferred<Vec<T>> {
        let values: Vec<Deferred<T>> = values.into_iter().collect();
        Deferred::from_fn(move || values.iter().map(Deferred::resolve).collect())
    }

    pub fn into_value(&self) -> Deferred<Value>
    where
        T: Into<Value>,
    {
        self.map(<T as Into<Value>>::into)
    }
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    pub fn ready(value: T) -> Self {
        Deferred::from_fn(move || Ok(value.clone()))
    }

    /// Creates an unbound deferred together with the setter the executor fills.
    pub fn slot(label: impl Into<String>) -> (Self, Slot<T>) {
        let label: Arc<str> = Arc::from(label.into());
        let cell: Arc<OnceLock<T>> = Arc::new(OnceLock::new());
        let slot = Slot {
            label: Arc::clone(&label),
            cell: Arc::clone(&cell),
        };
        let deferred = Deferred::from_fn(move || {
            cell.get()
                .cloned()
                .ok_or_else(|| DeferredError::Unbound(label.to_string()))
        });
        (deferred, slot)
    }
}

impl<T: PartialEq + Send + Sync + 'static> Deferred<T> {
    pub fn equals(&self, other: impl Into<Deferred<T>>) -> Deferred<bool> {
        let other = other.into();
        self.zip(&other).map(|(left, right)| left == right)
    }
}

impl<T: Clone + Send + Sync + 'static> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Deferred::ready(value)
    }
}

impl From<u64> for Deferred<U256> {
    fn from(value: u64) -> Self {
        Deferred::ready(U256::from(value))
    }
}

impl From<&str> for Deferred<Value> {
    fn from(value: &str) -> Self {
        Deferred::ready(Value::from(value))
    }
}

impl Deferred<bool> {
    pub fn not(&self) -> Deferred<bool> {
        self.map(|value| !value)
    }

    /// Short-circuits: `other` is not resolved when `self` is false.
    pub fn and(&self, other: impl Into<Deferred<bool>>) -> Deferred<bool> {
        let left = self.clone();
        let right = other.into();
        Deferred::from_fn(move || Ok(left.resolve()? && right.resolve()?))
    }

    pub fn or(&self, other: impl Into<Deferred<bool>>) -> Deferred<bool> {
        let left = self.clone();
        let right = other.into();
        Deferred::from_fn(move || Ok(left.resolve()? || right.resolve()?))
    }

    pub fn then_else<T: Send + Sync + 'static>(
        &self,
        then_value: impl Into<Deferred<T>>,
        else_value: impl Into<Deferred<T>>,
    ) -> Deferred<T> {
        let condition = self.clone();
        let then_value = then_value.into();
        let else_value = else_value.into();
        Deferred::from_fn(move || {
            if condition.resolve()? {
                then_value.resolve()
            } else {
                else_value.resolve()
            }
        })
    }
}

impl Deferred<U256> {
    fn arith(
        &self,
        other: impl Into<Deferred<U256>>,
        f: fn(U256, U256) -> DeferredResult<U256>,
    ) -> Deferred<U256> {
        let other = other.into();
        self.zip(&other).try_map(move |(left, right)| f(left, right))
    }

    fn compare(
        &self,
        other: impl Into<Deferred<U256>>,
        f: fn(&U256, &U256) -> bool,
    ) -> Deferred<bool> {
        let other = other.into();
        self.zip(&other).map(move |(left, right)| f(&left, &right))
    }

    pub fn add(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_add(b).ok_or(DeferredError::Overflow("add"))
        })
    }

    pub fn sub(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_sub(b).ok_or(DeferredError::Overflow("sub"))
        })
    }

    pub fn mul(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_mul(b).ok_or(DeferredError::Overflow("mul"))
        })
    }

    pub fn div(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_div(b).ok_or(DeferredError::DivideByZero("div"))
        })
    }

    pub fn rem(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_rem(b).ok_or(DeferredError::DivideByZero("rem"))
        })
    }

    pub fn pow(&self, other: impl Into<Deferred<U256>>) -> Deferred<U256> {
        self.arith(other, |a, b| {
            a.checked_pow(b).ok_or(DeferredError::Overflow("pow"))
        })
    }

    pub fn lt(&self, other: impl Into<Deferred<U256>>) -> Deferred<bool> {
        self.compare(other, |a, b| a < b)
    }

    pub fn lte(&self, other: impl Into<Deferred<U256>>) -> Deferred<bool> {
        self.compare(other, |a, b| a <= b)
    }

    pub fn gt(&self, other: impl Into<Deferred<U256>>) -> Deferred<bool> {
        self.compare(other, |a, b| a > b)
    }

    pub fn gte(&self, other: impl Into<Deferred<U256>>) -> Deferred<bool> {
        self.compare(other, |a, b| a >= b)
    }

    pub fn is_zero(&self) -> Deferred<bool> {
        self.map(|value| value.is_zero())
    }
}

impl Deferred<Bytes> {
    pub fn len(&self) -> Deferred<usize> {
        self.map(|bytes| bytes.len())
    }
}

/// Typed views over call results; the variant is fixed by the declared return shape.
impl Deferred<Value> {
    pub fn number(&self) -> Deferred<U256> {
        self.try_map(|value| Ok(value.as_number()?))
    }

    pub fn boolean(&self) -> Deferred<bool> {
        self.try_map(|value| Ok(value.as_bool()?))
    }

    pub fn address(&self) -> Deferred<Address> {
        self.try_map(|value| Ok(value.as_address()?))
    }

    pub fn bytes(&self) -> Deferred<Bytes> {
        self.try_map(|value| Ok(value.as_bytes()?))
    }

    pub fn text(&self) -> Deferred<String> {
        self.try_map(|value| Ok(value.as_text()?.to_owned()))
    }

    pub fn field(&self, name: impl Into<String>) -> Deferred<Value> {
        let name = name.into();
        self.try_map(move |value| Ok(value.field(&name)?))
    }

    pub fn index(&self, index: usize) -> Deferred<Value> {
        self.try_map(move |value| Ok(value.index(index)?))
    }
}

/// Resolves all inputs eagerly, in order, then applies `f` to the resolved slice.
pub fn combine<T, U>(
    values: impl IntoIterator<Item = Deferred<T>>,
    f: impl Fn(&[T]) -> U + Send + Sync + 'static,
) -> Deferred<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    Deferred::join(values).map(move |resolved| f(&resolved))
}

/// Folds the resolved inputs left to right starting from `init`.
pub fn reduce<T, U>(
    values: impl IntoIterator<Item = Deferred<T>>,
    init: U,
    f: impl Fn(U, T) -> U + Send + Sync + 'static,
) -> Deferred<U>
where
    T: Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    Deferred::join(values).map(move |resolved| resolved.into_iter().fold(init.clone(), &f))
}

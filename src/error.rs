use std::{
    borrow::Cow,
    fmt::Display,
    ops::{Deref, DerefMut},
};

use thiserror::Error;

use crate::{pin::PinDirection, pin::PinId, wire::WireId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("wire is already connected")]
    AlreadyConnected,

    #[error("wire was deleted")]
    Deleted,

    #[error("cannot connect {0} to itself")]
    SamePin(PinId),

    #[error("both pins are {0:?}, expected one source and one target")]
    SameRole(PinDirection),

    #[error("{0} was deleted")]
    PinDeleted(PinId),

    #[error("{0} did not exist")]
    UnknownPin(PinId),

    #[error("wire {0} did not exist")]
    UnknownWire(WireId),

    #[error("a connected wire needs at least 2 anchor points, got {0}")]
    NotEnoughPoints(usize),
}

pub type DynStaticStr = Cow<'static, str>;

/// Tree of non-fatal errors, grouped by what was being done when they
/// happened.
pub struct ErrorList {
    pub errors: Vec<Box<dyn Display + Send + Sync + 'static>>,
    pub inner: Vec<ErrorContext>,
}

pub struct ErrorContext {
    pub context: DynStaticStr,
    pub list: ErrorList,
}

pub struct ErrorContextGuard<'a, F, S>
where
    F: FnOnce() -> S,
    S: Into<DynStaticStr>,
{
    parent: &'a mut ErrorList,
    list: ErrorList,
    context: Option<F>,
}

impl<'a, F, S> Drop for ErrorContextGuard<'a, F, S>
where
    F: FnOnce() -> S,
    S: Into<DynStaticStr>,
{
    fn drop(&mut self) {
        if !self.list.is_empty() {
            if let Some(ctx_gen) = self.context.take() {
                let list = std::mem::replace(&mut self.list, ErrorList::new());
                self.parent.inner.push(ErrorContext {
                    context: ctx_gen().into(),
                    list,
                });
            }
        }
    }
}

impl ErrorList {
    pub fn new() -> Self {
        Self {
            errors: vec![],
            inner: vec![],
        }
    }

    /// Errors pushed through the returned guard end up under `f()`'s
    /// context. The context string is only built if something was pushed.
    pub fn enter_context<F, S>(&mut self, f: F) -> ErrorContextGuard<'_, F, S>
    where
        F: FnOnce() -> S,
        S: Into<DynStaticStr>,
    {
        ErrorContextGuard {
            parent: self,
            list: ErrorList::new(),
            context: Some(f),
        }
    }

    pub fn push_error<E: Display + Send + Sync + 'static>(&mut self, error: E) {
        self.errors.push(Box::new(error));
    }

    pub fn clear_error<T, E: Display + Send + Sync + 'static>(
        &mut self,
        res: Result<T, E>,
    ) -> Option<T> {
        match res {
            Ok(t) => Some(t),
            Err(e) => {
                self.push_error(e);
                None
            }
        }
    }

    pub fn report_none<T, E: Display + Send + Sync + 'static>(
        &mut self,
        opt: Option<T>,
        err: impl FnOnce() -> E,
    ) -> Option<T> {
        match opt {
            Some(t) => Some(t),
            None => {
                self.push_error(err());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.inner.is_empty()
    }

    /// Total number of errors, including nested contexts.
    pub fn len(&self) -> usize {
        self.errors.len() + self.inner.iter().map(|c| c.list.len()).sum::<usize>()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.inner.clear();
    }

    fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        for ctx in self.inner.iter() {
            writeln!(f, "{:indent$}{}:", "", ctx.context, indent = depth * 2)?;
            ctx.list.fmt_indented(f, depth + 1)?;
        }
        for error in self.errors.iter() {
            writeln!(f, "{:indent$}{}", "", error, indent = depth * 2)?;
        }
        Ok(())
    }
}

impl Default for ErrorList {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ErrorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl std::fmt::Debug for ErrorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<'a, F, S> Deref for ErrorContextGuard<'a, F, S>
where
    F: FnOnce() -> S,
    S: Into<DynStaticStr>,
{
    type Target = ErrorList;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl<'a, F, S> DerefMut for ErrorContextGuard<'a, F, S>
where
    F: FnOnce() -> S,
    S: Into<DynStaticStr>,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.list
    }
}

pub trait OptionReport {
    fn report_none<E: Display + Send + Sync + 'static>(
        self,
        list: &mut ErrorList,
        err: impl FnOnce() -> E,
    ) -> Self;
}

pub trait ResultReport<T, E>
where
    E: Display + Send + Sync + 'static,
{
    fn report_error(self, list: &mut ErrorList) -> Option<T>;
}

impl<T> OptionReport for Option<T> {
    fn report_none<E: Display + Send + Sync + 'static>(
        self,
        list: &mut ErrorList,
        err: impl FnOnce() -> E,
    ) -> Self {
        list.report_none(self, err)
    }
}

impl<T, E: Display + Send + Sync + 'static> ResultReport<T, E> for Result<T, E> {
    fn report_error(self, list: &mut ErrorList) -> Option<T> {
        list.clear_error(self)
    }
}

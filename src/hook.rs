//! Request state wrapper shared by every read view.
//!
//! `ApiHook` turns any async backend call into observable `data` / `loading`
//! / `error` state. `loading` is true exactly while a call is in flight.

use crate::error::FolioResult;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use tracing::error;

#[derive(Debug, Clone, PartialEq)]
pub struct HookState<T> {
    /// Last successful result.
    pub data: Option<T>,
    pub loading: bool,
    /// User-facing message of the last failure.
    pub error: Option<String>,
}

impl<T> Default for HookState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

type ApiFn<A, T> = Rc<dyn Fn(A) -> LocalBoxFuture<'static, FolioResult<T>>>;

pub struct ApiHook<A, T> {
    func: ApiFn<A, T>,
    state: Rc<RefCell<HookState<T>>>,
}

impl<A, T> Clone for ApiHook<A, T> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            state: self.state.clone(),
        }
    }
}

/// Clears `loading` when the call settles, including early return, unwinding
/// and the future being dropped mid-flight.
struct LoadingGuard<'a, T> {
    state: &'a RefCell<HookState<T>>,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.loading = false;
        }
    }
}

impl<A: 'static, T: Clone + 'static> ApiHook<A, T> {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = FolioResult<T>> + 'static,
    {
        Self {
            func: Rc::new(move |args| func(args).boxed_local()),
            state: Rc::new(RefCell::new(HookState::default())),
        }
    }

    /// Runs the wrapped call. The error is recorded and also returned.
    pub async fn request(&self, args: A) -> FolioResult<T> {
        {
            let mut state = self.state.borrow_mut();
            state.error = None;
            state.loading = true;
        }
        let _loading = LoadingGuard { state: &self.state };

        match (self.func)(args).await {
            Ok(result) => {
                self.state.borrow_mut().data = Some(result.clone());
                Ok(result)
            }
            Err(err) => {
                error!(error = %err, "API error");
                self.state.borrow_mut().error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn snapshot(&self) -> HookState<T> {
        self.state.borrow().clone()
    }

    /// Local update, e.g. after removing an item without refetching.
    pub fn set_data(&self, data: Option<T>) {
        self.state.borrow_mut().data = data;
    }

    pub fn reset(&self) {
        *self.state.borrow_mut() = HookState::default();
    }
}

impl<T: Clone + 'static> ApiHook<(), T> {
    pub async fn fetch(&self) -> FolioResult<T> {
        self.request(()).await
    }
}

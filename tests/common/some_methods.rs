//! A small interface with every return shape, its real implementation, and
//! a deferred handle for it.

use super::Events;
use defcon::util::{yield_now, yield_times};
use defcon::{
    Arguments, CallInterceptor, Dispatch, Fault, Forwarded, MethodId, Outcome, ProxyHandle,
};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

pub const DUMMY: MethodId = MethodId::new("dummy");
pub const RETURN_VALUE: MethodId = MethodId::new("return_value");
pub const RETURN_ASYNC: MethodId = MethodId::new("return_async");
pub const RETURN_TIMESTAMP_ASYNC: MethodId = MethodId::new("return_timestamp_async");
pub const RETURN_SHARED: MethodId = MethodId::new("return_shared");
pub const NO_RESULT: MethodId = MethodId::new("no_result");
pub const NO_RESULT_ASYNC: MethodId = MethodId::new("no_result_async");

pub trait SomeMethodsApi {
    fn dummy(&self) -> impl Future<Output = Outcome<()>> + Send;
    fn return_value(&self, value: SystemTime) -> Outcome<SystemTime>;
    fn return_async(&self, value: i32) -> impl Future<Output = Outcome<i32>> + Send;
    fn return_timestamp_async(
        &self,
        value: SystemTime,
    ) -> impl Future<Output = Outcome<SystemTime>> + Send;
    fn return_shared(
        &self,
        value: Arc<String>,
    ) -> impl Future<Output = Outcome<Arc<String>>> + Send;
    fn no_result(&self) -> Outcome<()>;
    fn no_result_async(&self) -> impl Future<Output = Outcome<()>> + Send;
}

pub struct SomeMethods {
    events: Events,
}

impl SomeMethods {
    pub fn new(events: Events) -> Self {
        events.log("created");
        Self { events }
    }

    /// Builds the target over several polls.
    pub async fn create(events: Events) -> Outcome<Self> {
        yield_times(2).await;
        yield_now().await;
        yield_times(2).await;
        Outcome::Ok(Self::new(events))
    }

    async fn pause() {
        yield_times(2).await;
        yield_now().await;
    }
}

impl SomeMethodsApi for SomeMethods {
    fn dummy(&self) -> impl Future<Output = Outcome<()>> + Send {
        async {
            Self::pause().await;
            Outcome::Ok(())
        }
    }

    fn return_value(&self, value: SystemTime) -> Outcome<SystemTime> {
        self.events.log(format!("{value:?}"));
        Outcome::Ok(value)
    }

    fn return_async(&self, value: i32) -> impl Future<Output = Outcome<i32>> + Send {
        async move {
            Self::pause().await;
            self.events.log(value.to_string());
            Outcome::Ok(value)
        }
    }

    fn return_timestamp_async(
        &self,
        value: SystemTime,
    ) -> impl Future<Output = Outcome<SystemTime>> + Send {
        async move {
            Self::pause().await;
            self.events.log(format!("{value:?}"));
            Outcome::Ok(value)
        }
    }

    fn return_shared(
        &self,
        value: Arc<String>,
    ) -> impl Future<Output = Outcome<Arc<String>>> + Send {
        async move {
            Self::pause().await;
            self.events.log(value.as_str());
            Outcome::Ok(value)
        }
    }

    fn no_result(&self) -> Outcome<()> {
        self.events.log("void");
        Outcome::Ok(())
    }

    fn no_result_async(&self) -> impl Future<Output = Outcome<()>> + Send {
        async {
            Self::pause().await;
            self.events.log("void");
            Outcome::Ok(())
        }
    }
}

impl Dispatch for SomeMethods {
    fn dispatch(&self, method: &MethodId, args: Arguments) -> Result<Forwarded<'_>, Fault> {
        let forwarded = match *method {
            DUMMY => {
                args.finish()?;
                Forwarded::completion(self.dummy())
            }
            RETURN_VALUE => Forwarded::immediate(self.return_value(single(args)?)),
            RETURN_ASYNC => Forwarded::value(self.return_async(single(args)?)),
            RETURN_TIMESTAMP_ASYNC => Forwarded::value(self.return_timestamp_async(single(args)?)),
            RETURN_SHARED => Forwarded::value(self.return_shared(single(args)?)),
            NO_RESULT => {
                args.finish()?;
                Forwarded::immediate(self.no_result())
            }
            NO_RESULT_ASYNC => {
                args.finish()?;
                Forwarded::completion(self.no_result_async())
            }
            other => return Err(Fault::unknown_method(other)),
        };
        Ok(forwarded)
    }
}

fn single<A: Any>(mut args: Arguments) -> Result<A, Fault> {
    let value = args.next_arg()?;
    args.finish()?;
    Ok(value)
}

/// Deferred handle over [`SomeMethods`].
#[derive(Clone)]
pub struct SomeMethodsHandle {
    interceptor: CallInterceptor<SomeMethods>,
}

impl ProxyHandle for SomeMethodsHandle {
    type Target = SomeMethods;

    fn from_interceptor(interceptor: CallInterceptor<SomeMethods>) -> Self {
        Self { interceptor }
    }
}

impl SomeMethodsHandle {
    pub fn interceptor(&self) -> &CallInterceptor<SomeMethods> {
        &self.interceptor
    }
}

impl SomeMethodsApi for SomeMethodsHandle {
    fn dummy(&self) -> impl Future<Output = Outcome<()>> + Send {
        self.interceptor.call_fire_and_forget(DUMMY, Arguments::new())
    }

    fn return_value(&self, value: SystemTime) -> Outcome<SystemTime> {
        self.interceptor
            .call_sync(RETURN_VALUE, Arguments::new().with(value))
    }

    fn return_async(&self, value: i32) -> impl Future<Output = Outcome<i32>> + Send {
        self.interceptor
            .call_async::<i32>(RETURN_ASYNC, Arguments::new().with(value))
    }

    fn return_timestamp_async(
        &self,
        value: SystemTime,
    ) -> impl Future<Output = Outcome<SystemTime>> + Send {
        self.interceptor
            .call_async::<SystemTime>(RETURN_TIMESTAMP_ASYNC, Arguments::new().with(value))
    }

    fn return_shared(
        &self,
        value: Arc<String>,
    ) -> impl Future<Output = Outcome<Arc<String>>> + Send {
        self.interceptor
            .call_async::<Arc<String>>(RETURN_SHARED, Arguments::new().with(value))
    }

    fn no_result(&self) -> Outcome<()> {
        self.interceptor.call_sync(NO_RESULT, Arguments::new())
    }

    fn no_result_async(&self) -> impl Future<Output = Outcome<()>> + Send {
        self.interceptor
            .call_fire_and_forget(NO_RESULT_ASYNC, Arguments::new())
    }
}

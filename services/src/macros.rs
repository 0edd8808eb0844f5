//! Public macros for ergonomic service resolution.

/// Resolves a required service from a `ServiceProvider`.
///
/// Unlike `ServiceProvider::get_required`, this macro panics if the service cannot be
/// resolved, with the resolution error in the message.
///
/// # Panics
///
/// Panics if the service is not registered, the match is ambiguous, or activation
/// fails.
///
/// # Examples
///
/// ```
/// use fibre_services::{
///   resolve, Kernel, ServiceCollection, ServiceCollectionAdapter, ServiceProvider,
/// };
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let mut services = ServiceCollection::new();
/// services.add_instance(Arc::new(String::from("hello")));
/// services.add_singleton::<dyn Greeter>(|_| Ok(Arc::new(EnglishGreeter)));
///
/// let kernel = Kernel::new();
/// ServiceCollectionAdapter::new().populate(&kernel, &services).unwrap();
/// let provider = ServiceProvider::new(kernel);
///
/// assert_eq!(*resolve!(provider, String), "hello");
/// assert_eq!(resolve!(provider, trait Greeter).greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a concrete type: resolve!(provider, MyService)
    ($provider:expr, $type:ty) => {
        $provider
            .get_required::<$type>()
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required service {}: {}",
                    std::any::type_name::<$type>(),
                    err
                )
            })
    };

    // Arm for resolving a trait object: resolve!(provider, trait MyTrait)
    ($provider:expr, trait $trait_ident:ident) => {
        $provider
            .get_required::<dyn $trait_ident>()
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required trait service {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    err
                )
            })
    };
}

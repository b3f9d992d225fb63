// vim: tw=80
//! Proc Macros for use with Decoy
//!
//! You probably don't want to use this crate directly.  Instead, you use use
//! its reexports via the [`decoy`](../decoy/index.html) crate.

extern crate proc_macro;

use proc_macro2::TokenStream;

mod mockable;
use crate::mockable::do_mockable;

/// Generate a mock identifier from the regular one: eg "Foo" => "MockFoo"
fn gen_mock_ident(ident: &syn::Ident) -> syn::Ident {
    syn::Ident::new(&format!("Mock{}", ident), ident.span())
}

/// Generate the setup recorder's identifier: eg "Foo" => "FooRecorder"
fn gen_recorder_ident(ident: &syn::Ident) -> syn::Ident {
    syn::Ident::new(&format!("{}Recorder", ident), ident.span())
}

/// Generate a mock struct for a trait.
///
/// For a trait `Foo` this generates:
///
/// * `MockFoo`, which implements `Foo` by running every method call through
///   a [`decoy::Mock`](../decoy/struct.Mock.html), and dereferences to it.
///   Its `setup` and `verify` methods take a descriptor closure that calls
///   exactly one method of a `FooRecorder`.
/// * `FooRecorder`, with one method per trait method.  Each argument may be
///   anything convertible into a `Matcher`, including a plain value.
///
/// Every argument type must be convertible into a `decoy::Value`, and every
/// return type must implement `decoy::FromValue`.  Methods must take `&self`
/// or `&mut self`.  Generic traits, generic methods, associated types, and
/// associated constants are not supported.
///
/// # Examples
///
/// ```
/// # use decoy::*;
/// #[mockable]
/// pub trait Foo {
///     fn foo(&self, key: i16) -> u32;
/// }
///
/// let mock = MockFoo::new();
/// mock.setup(|x| x.foo(4)).unwrap().returns(40);
/// assert_eq!(40, mock.foo(4));
/// assert_eq!(0, mock.foo(5));
/// ```
///
/// A mock may also wrap a real implementation, and call it for every method
/// that has no setup.
///
/// ```
/// # use decoy::*;
/// #[mockable]
/// pub trait Foo {
///     fn foo(&self, key: i16) -> u32;
/// }
/// struct Real;
/// impl Foo for Real {
///     fn foo(&self, key: i16) -> u32 { key as u32 * 2 }
/// }
///
/// let mock = MockFoo::of_instance(Real);
/// mock.setup(|x| x.foo(1)).unwrap().returns(100);
/// assert_eq!(100, mock.foo(1));
/// assert_eq!(6, mock.foo(3));
/// ```
#[proc_macro_attribute]
pub fn mockable(attrs: proc_macro::TokenStream,
                input: proc_macro::TokenStream) -> proc_macro::TokenStream
{
    let input: TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_mockable(attrs.into(), input));
    output.into()
}

// vim: tw=80
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use syn::{
    *,
    spanned::Spanned
};

use crate::{gen_mock_ident, gen_recorder_ident};

/// Accumulate an error, so that every problem is reported at once
fn push_error(errors: &mut Option<Error>, e: Error) {
    match errors {
        Some(errors) => errors.combine(e),
        None => *errors = Some(e)
    }
}

fn unsupported(what: &str, name: &Ident) -> String {
    format!("#[mockable] does not support {} like `{}`", what, name)
}

/// A trait method that can be mocked
struct MockableMethod {
    /// The method's signature, with each argument bound to a plain identifier
    sig: Signature,
    /// Names of the non-receiver arguments
    args: Vec<Ident>,
    /// Does the method take `&mut self`?
    mutable: bool,
}

impl MockableMethod {
    fn new(method: &TraitItemFn, errors: &mut Option<Error>) -> Option<Self> {
        let sig = &method.sig;
        let name = &sig.ident;
        let mut ok = true;
        let mut fail = |span: Span, msg: String| {
            push_error(errors, Error::new(span, msg));
            ok = false;
        };
        let generics = &sig.generics;
        if !generics.params.is_empty() || generics.where_clause.is_some() {
            fail(sig.generics.span(), unsupported("generic methods", name));
        }
        if let Some(a) = &sig.asyncness {
            fail(a.span(), unsupported("async methods", name));
        }
        if let Some(u) = &sig.unsafety {
            fail(u.span(), unsupported("unsafe methods", name));
        }
        if let Some(v) = &sig.variadic {
            fail(v.span(), unsupported("variadic methods", name));
        }
        let mut mutable = false;
        match sig.receiver() {
            None => fail(sig.span(), unsupported("static methods", name)),
            Some(r) if r.reference.is_none() || r.colon_token.is_some() => {
                fail(r.span(), format!(
                    "method `{}` must take `&self` or `&mut self`", name))
            },
            Some(r) => mutable = r.mutability.is_some()
        }
        if let ReturnType::Type(_, ty) = &sig.output {
            match **ty {
                Type::Reference(_) => fail(ty.span(),
                    unsupported("methods returning references", name)),
                Type::ImplTrait(_) => fail(ty.span(),
                    unsupported("methods returning impl Trait", name)),
                _ => ()
            }
        }

        let mut sig = sig.clone();
        let mut args = Vec::new();
        for (i, input) in sig.inputs.iter_mut().enumerate() {
            if let FnArg::Typed(pt) = input {
                if let Type::ImplTrait(_) = *pt.ty {
                    fail(pt.ty.span(),
                        unsupported("impl Trait arguments in methods", name));
                }
                let ident = match &*pt.pat {
                    Pat::Ident(pi) => pi.ident.clone(),
                    _ => format_ident!("arg{}", i)
                };
                pt.attrs.clear();
                *pt.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: ident.clone(),
                    subpat: None
                });
                args.push(ident);
            }
        }
        if ok {
            Some(MockableMethod { sig, args, mutable })
        } else {
            None
        }
    }

    /// The recording method of the setup recorder
    fn gen_recorder(&self, vis: &Visibility) -> TokenStream {
        let ident = &self.sig.ident;
        let name = ident.to_string();
        let args = &self.args;
        quote!(
            #vis fn #ident(&self,
                #(#args: impl ::std::convert::Into<::decoy::Matcher>),*)
            {
                let __decoy_matchers: ::std::vec::Vec<::decoy::Matcher> =
                    ::std::vec![#(::std::convert::Into::into(#args)),*];
                self.0.call(#name, __decoy_matchers);
            }
        )
    }

    /// The mock's implementation of the method
    fn gen_impl(&self) -> TokenStream {
        let sig = &self.sig;
        let ident = &sig.ident;
        let name = ident.to_string();
        let args = &self.args;
        let base = if self.mutable {
            quote!(&mut self.base)
        } else {
            quote!(&self.base)
        };
        quote!(
            #sig {
                let __decoy_args = ::std::vec![
                    #(::decoy::Value::from(
                        ::std::clone::Clone::clone(&#args))),*
                ];
                let __decoy_reply = self.mock
                    .intercept(::decoy::Kind::Call, #name, __decoy_args);
                match __decoy_reply {
                    ::std::result::Result::Ok(::decoy::Reply::Base) => {
                        match #base {
                            ::std::option::Option::Some(__decoy_base) =>
                                __decoy_base.#ident(#(#args),*),
                            ::std::option::Option::None =>
                                ::decoy::__private::absent(),
                        }
                    },
                    __decoy_reply =>
                        ::decoy::__private::resolve(__decoy_reply),
                }
            }
        )
    }
}

/// A trait that `#[mockable]` was applied to
struct MockableTrait {
    vis: Visibility,
    ident: Ident,
    methods: Vec<MockableMethod>,
}

impl MockableTrait {
    fn new(item: &ItemTrait) -> Result<Self> {
        let mut errors = None;
        let name = &item.ident;
        if !item.generics.params.is_empty() ||
            item.generics.where_clause.is_some()
        {
            push_error(&mut errors, Error::new(item.generics.span(),
                unsupported("generic traits", name)));
        }
        if let Some(u) = &item.unsafety {
            push_error(&mut errors, Error::new(u.span(),
                unsupported("unsafe traits", name)));
        }
        let mut methods = Vec::new();
        for trait_item in item.items.iter() {
            let msg = match trait_item {
                TraitItem::Fn(f) => {
                    if let Some(m) = MockableMethod::new(f, &mut errors) {
                        methods.push(m);
                    }
                    continue;
                },
                TraitItem::Const(c) => {
                    unsupported("associated constants", &c.ident)
                },
                TraitItem::Type(t) => unsupported("associated types", &t.ident),
                _ => "#[mockable] does not support this kind of trait item"
                    .to_owned()
            };
            push_error(&mut errors, Error::new(trait_item.span(), msg));
        }
        match errors {
            Some(e) => Err(e),
            None => Ok(MockableTrait {
                vis: item.vis.clone(),
                ident: item.ident.clone(),
                methods
            })
        }
    }

    fn gen_struct(&self) -> TokenStream {
        let vis = &self.vis;
        let trait_ident = &self.ident;
        let mock_ident = gen_mock_ident(trait_ident);
        let recorder_ident = gen_recorder_ident(trait_ident);
        let mock_name = mock_ident.to_string();
        let docstr = format!("Mock implementation of [`{}`]", trait_ident);
        quote!(
            #[doc = #docstr]
            #[allow(dead_code)]
            #vis struct #mock_ident {
                mock: ::decoy::Mock,
                base: ::std::option::Option<
                    ::std::boxed::Box<dyn #trait_ident>>,
            }

            #[allow(dead_code)]
            impl #mock_ident {
                /// A loose mock
                #vis fn new() -> Self {
                    Self::with_behavior(::decoy::Behavior::Loose)
                }

                #vis fn with_behavior(behavior: ::decoy::Behavior) -> Self {
                    #mock_ident {
                        mock: ::decoy::Mock::builder()
                            .name(#mock_name)
                            .behavior(behavior)
                            .build(),
                        base: ::std::option::Option::None,
                    }
                }

                /// A loose mock that calls `base` for every method it has no
                /// setup for
                #vis fn of_instance<B: #trait_ident + 'static>(base: B) -> Self
                {
                    Self::of_instance_with_behavior(base,
                        ::decoy::Behavior::Loose)
                }

                #vis fn of_instance_with_behavior<B>(base: B,
                    behavior: ::decoy::Behavior) -> Self
                    where B: #trait_ident + 'static
                {
                    #mock_ident {
                        mock: ::decoy::Mock::builder()
                            .name(#mock_name)
                            .behavior(behavior)
                            .call_base(true)
                            .build(),
                        base: ::std::option::Option::Some(
                            ::std::boxed::Box::new(base)),
                    }
                }

                /// Declare an expectation for the method called by
                /// `descriptor`
                #vis fn setup<F>(&self, descriptor: F)
                    -> ::std::result::Result<::decoy::ExpectationGuard<'_>,
                                             ::decoy::MockError>
                    where F: for<'r> ::std::ops::FnOnce(&#recorder_ident<'r>)
                {
                    self.mock.setup(|r| descriptor(&#recorder_ident(r)))
                }

                /// Check how many times the method called by `descriptor`
                /// was invoked
                #vis fn verify<F, T>(&self, descriptor: F, times: T)
                    -> ::std::result::Result<(), ::decoy::MockError>
                    where F: for<'r> ::std::ops::FnOnce(&#recorder_ident<'r>),
                          T: ::std::convert::Into<::decoy::Times>
                {
                    self.mock.verify(|r| descriptor(&#recorder_ident(r)), times)
                }
            }

            impl ::std::default::Default for #mock_ident {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl ::std::ops::Deref for #mock_ident {
                type Target = ::decoy::Mock;

                fn deref(&self) -> &::decoy::Mock {
                    &self.mock
                }
            }

            impl ::std::fmt::Debug for #mock_ident {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>)
                    -> ::std::fmt::Result
                {
                    f.debug_struct(#mock_name)
                        .field("mock", &self.mock)
                        .field("has_base", &self.base.is_some())
                        .finish()
                }
            }
        )
    }

    fn gen_recorder(&self) -> TokenStream {
        let vis = &self.vis;
        let trait_ident = &self.ident;
        let recorder_ident = gen_recorder_ident(trait_ident);
        let docstr = format!(
            "Records the [`{}`] method called by a setup or verify descriptor",
            trait_ident);
        let methods = self.methods.iter().map(|m| m.gen_recorder(vis));
        quote!(
            #[doc = #docstr]
            #vis struct #recorder_ident<'r>(&'r ::decoy::Recorder);

            #[allow(dead_code)]
            impl<'r> #recorder_ident<'r> {
                #(#methods)*
            }
        )
    }

    fn gen_impl(&self) -> TokenStream {
        let trait_ident = &self.ident;
        let mock_ident = gen_mock_ident(trait_ident);
        let methods = self.methods.iter().map(MockableMethod::gen_impl);
        quote!(
            impl #trait_ident for #mock_ident {
                #(#methods)*
            }
        )
    }
}

impl ToTokens for MockableTrait {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.gen_struct());
        tokens.extend(self.gen_recorder());
        tokens.extend(self.gen_impl());
    }
}

/// Generate the mock struct, recorder, and trait impl for a trait.  On error,
/// generate nothing but the compile errors.
pub(crate) fn do_mockable(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    if !attrs.is_empty() {
        return Error::new(attrs.span(), "#[mockable] takes no arguments")
            .to_compile_error();
    }
    let item: ItemTrait = match parse2(input) {
        Ok(item) => item,
        Err(e) => {
            let msg = "#[mockable] may only be applied to traits";
            return Error::new(e.span(), msg).to_compile_error();
        }
    };
    match MockableTrait::new(&item) {
        Ok(mockable) => mockable.into_token_stream(),
        Err(e) => e.to_compile_error()
    }
}

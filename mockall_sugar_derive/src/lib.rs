// vim: tw=80
//! Proc Macros for use with mockall_sugar
//!
//! You probably don't want to use this crate directly.  Instead, you use its
//! reexports via the [`mockall_sugar`](https://docs.rs/mockall_sugar) crate.
//!
//! Both macros rewrite a call written against a mock, like
//! `mock.foo(eq(5), _)`, into the equivalent Mockall builder chain on
//! `mock.expect_foo()`.  Every argument is a matcher.  The matchers are
//! combined into one closure and registered with the mock's ledger, which the
//! expectation's `withf` closure consults to decide whether it handles a call.
//! The `returning` closure commits argument captures and call counts once the
//! expectation was actually selected.

#![cfg_attr(test, deny(warnings))]
extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{
    *,
    ext::IdentExt,
    parse::{Parse, ParseStream},
    spanned::Spanned
};

/// Which macro is being expanded
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    /// `on!`: the newest matching stub answers a call.
    Stub,
    /// `verify!`: counts matching calls, checked at checkpoint or drop time.
    Verify
}

/// What a stubbed call does once its expectation has been selected
enum Verb {
    Returns(Expr),
    ReturnsConsecutively(Expr),
    Panics(Expr),
    Answers(Expr),
    DoesNothing
}

impl Parse for Verb {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident = input.call(Ident::parse_any)?;
        match ident.to_string().as_str() {
            "returns" => Ok(Verb::Returns(input.parse()?)),
            "returns_consecutively" =>
                Ok(Verb::ReturnsConsecutively(input.parse()?)),
            "panics" => Ok(Verb::Panics(input.parse()?)),
            "answers" => Ok(Verb::Answers(input.parse()?)),
            "does_nothing" => Ok(Verb::DoesNothing),
            _ => Err(Error::new(ident.span(),
                "unknown stubbing verb.  Expected one of `returns`, `returns_consecutively`, `panics`, `answers`, or `does_nothing`"))
        }
    }
}

/// The parsed body of `on!` or `verify!`:
/// `receiver.method(matchers..) [, mode] [=> verb]`
struct Stubbing {
    call: ExprMethodCall,
    mode: Option<Expr>,
    verb: Option<Verb>
}

impl Parse for Stubbing {
    fn parse(input: ParseStream) -> Result<Self> {
        let call = method_call(input.parse()?)?;
        let mode = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            Some(input.parse()?)
        } else {
            None
        };
        let verb = if input.peek(Token![=>]) {
            input.parse::<Token![=>]>()?;
            Some(input.parse()?)
        } else {
            None
        };
        if !input.is_empty() {
            return Err(input.error("unexpected tokens after the stubbed call"));
        }
        Ok(Stubbing{call, mode, verb})
    }
}

/// Peel off any grouping left behind by `macro_rules!` or parentheses
fn method_call(expr: Expr) -> Result<ExprMethodCall> {
    match expr {
        Expr::MethodCall(call) => Ok(call),
        Expr::Group(group) => method_call(*group.expr),
        Expr::Paren(paren) => method_call(*paren.expr),
        other => Err(Error::new(other.span(),
            "expected a method call on a mock, like `mock.method(args)`"))
    }
}

fn do_stubbing(kind: Kind, input: TokenStream) -> TokenStream {
    let stubbing: Stubbing = match parse2(input) {
        Ok(s) => s,
        Err(e) => return e.to_compile_error()
    };
    match expand(kind, stubbing) {
        Ok(ts) => ts,
        Err(e) => e.to_compile_error()
    }
}

fn expand(kind: Kind, stubbing: Stubbing) -> Result<TokenStream> {
    let Stubbing{call, mode, verb} = stubbing;
    if kind == Kind::Stub && verb.is_none() {
        return Err(Error::new(call.span(),
            "on! needs a stubbing verb, like `on!(mock.foo(_) => returns 42)`"));
    }
    let receiver = &call.receiver;
    let turbofish = &call.turbofish;
    let method = call.method.unraw();
    let method_name = method.to_string();
    let expect = format_ident!("expect_{}", method, span = call.method.span());
    // Only used in log events and failure messages
    let call_text = format!("{}({})", method_name, call.args.to_token_stream());

    let matchers = call.args.iter()
        .map(|arg| match arg {
            Expr::Infer(_) => quote!(::mockall_sugar::any()),
            arg => arg.to_token_stream()
        }).collect::<Vec<_>>();
    let argnames = (0..matchers.len())
        .map(|i| format_ident!("__mockall_sugar_arg{}", i))
        .collect::<Vec<_>>();
    let tparams = (0..matchers.len())
        .map(|i| format_ident!("A{}", i))
        .collect::<Vec<_>>();
    let indices = (0..matchers.len())
        .map(Index::from)
        .collect::<Vec<_>>();

    let matchers_setup = if matchers.is_empty() {
        TokenStream::new()
    } else {
        quote!(
            let __mockall_sugar_matchers = ::std::sync::Arc::new((
                #(#matchers,)*
            ));
            let __mockall_sugar_recorders =
                ::std::sync::Arc::clone(&__mockall_sugar_matchers);
        )
    };
    let checks = indices.iter().zip(argnames.iter())
        .map(|(i, argname)| quote!(
            && ::mockall_sugar::Matcher::matches(
                &__mockall_sugar_matchers.#i, #argname)
        ));
    let records = indices.iter()
        .map(|i| quote!(
            ::mockall_sugar::Recorder::record(&__mockall_sugar_recorders.#i);
        )).collect::<Vec<_>>();

    // The erased matcher is a trait object generic over the argument types,
    // so that every stub of a method shares one ledger.  Going through a
    // generic fn gives the closure a signature that accepts any lifetime.
    let erase = quote!(
        fn __mockall_sugar_erase<#(#tparams: ?Sized + 'static,)* F>(f: F)
            -> ::std::sync::Arc<dyn Fn(#(&#tparams),*) -> bool + Send + Sync>
            where F: Fn(#(&#tparams),*) -> bool + Send + Sync + 'static
        {
            ::std::sync::Arc::new(f)
        }
        let __mockall_sugar_matcher = __mockall_sugar_erase(
            move |#(#argnames),*| true #(#checks)*);
    );

    let (register, times, stub_records, tail) = match kind {
        Kind::Stub => {
            let times = mode.map(|mode| quote!(
                .times(::mockall_sugar::VerificationMode::from(#mode).range())
            ));
            (quote!(
                let __mockall_sugar_entry = __mockall_sugar_state.stub(
                    #method_name, #call_text, __mockall_sugar_matcher);
            ),
            times,
            records,
            None)
        },
        Kind::Verify => {
            let mode = mode.unwrap_or_else(|| parse_quote!(
                ::mockall_sugar::times(1)
            ));
            (quote!(
                let (__mockall_sugar_entry, __mockall_sugar_verification) =
                    __mockall_sugar_state.verification(
                        #method_name, #call_text,
                        ::mockall_sugar::VerificationMode::from(#mode),
                        __mockall_sugar_matcher,
                        move || { #(#records)* });
            ),
            None,
            Vec::new(),
            Some(quote!(; __mockall_sugar_verification)))
        }
    };

    let answer_pats = argnames.iter()
        .map(|argname| match verb {
            Some(Verb::Answers(_)) => argname.to_token_stream(),
            _ => quote!(_)
        }).collect::<Vec<_>>();
    let (answer_setup, answer) = match verb {
        Some(Verb::Returns(e)) => (
            quote!(let __mockall_sugar_answer = #e;),
            quote!(::std::clone::Clone::clone(&__mockall_sugar_answer))
        ),
        Some(Verb::ReturnsConsecutively(e)) => (
            quote!(let mut __mockall_sugar_answer =
                ::mockall_sugar::Consecutive::new(#e);),
            quote!(__mockall_sugar_answer.next_value())
        ),
        Some(Verb::Panics(e)) => (
            quote!(let __mockall_sugar_answer = #e;),
            quote!(::std::panic!("{}", __mockall_sugar_answer))
        ),
        Some(Verb::Answers(e)) => (
            quote!(#[allow(unused_mut)] let mut __mockall_sugar_answer = #e;),
            quote!(__mockall_sugar_answer(#(#argnames),*))
        ),
        Some(Verb::DoesNothing) => (TokenStream::new(), quote!(())),
        None => (
            TokenStream::new(),
            quote!(::std::default::Default::default())
        )
    };

    Ok(quote!({
        let __mockall_sugar_mock = (#receiver).__mockall_sugar_mock();
        let __mockall_sugar_state = __mockall_sugar_mock.__mockall_sugar_state();
        #matchers_setup
        #erase
        #register
        let __mockall_sugar_selector =
            ::std::sync::Arc::clone(&__mockall_sugar_entry);
        #answer_setup
        __mockall_sugar_mock.#expect #turbofish ()
            .withf(move |#(#argnames),*| __mockall_sugar_selector.selects(
                |__mockall_sugar_f| __mockall_sugar_f(#(#argnames),*)))
            #times
            .returning(move |#(#answer_pats),*| {
                #(#stub_records)*
                __mockall_sugar_entry.commit();
                #answer
            })
        #tail
    }))
}

/// Stub a call on a mock.
///
/// The first argument is a method call on a
/// [`Mocked`](../mockall_sugar/struct.Mocked.html) mock, written with
/// matchers in place of the arguments.  `_` stands for `any()`.  An optional
/// call count may follow, then `=>` and one of the stubbing verbs:
///
/// * `returns VALUE`: return a clone of `VALUE`.
/// * `returns_consecutively VALUES`: return each element of `VALUES` in turn,
///   then keep returning the last one.
/// * `panics MESSAGE`: panic with `MESSAGE`.
/// * `answers CLOSURE`: call `CLOSURE` with the method's arguments.
/// * `does_nothing`: return `()`.
///
/// When several stubs of a method match a call, the most recent one answers
/// it.  The macro evaluates to Mockall's `&mut Expectation`, so other Mockall
/// builder methods may be chained onto it.  Don't chain `returning` or `withf`,
/// though: that would replace the closures that pick the answering stub and
/// record captured arguments.
///
/// # Examples
/// ```ignore
/// on!(mock.foo(eq(4), _) => returns 42);
/// on!(mock.bar(_) => answers |x: u32| x + 1);
/// on!(mock.baz() => returns_consecutively [1, 2, 3]);
/// ```
#[proc_macro]
pub fn on(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    do_stubbing(Kind::Stub, input.into()).into()
}

/// Expect a call on a mock a given number of times.
///
/// The syntax is the same as [`on!`](macro@on), except that the call count
/// defaults to `times(1)` and the stubbing verb is optional.  The count is
/// checked when the mock is checkpointed or dropped.
///
/// Every matching call is counted, even when a stub answers it.  The verb, or
/// `Default::default()` without one, only answers calls that no stub matches.
///
/// The macro evaluates to a
/// [`Verification`](../mockall_sugar/struct.Verification.html), which can
/// add a description to the failure message or join an ordering constraint.
///
/// # Examples
/// ```ignore
/// verify!(mock.foo(eq(4), _), times(2));
/// verify!(mock.bar(captor.capture()), at_least(1) => returns 7);
/// verify!(mock.baz()).description("baz must run").in_sequence(&mut seq);
/// ```
#[proc_macro]
pub fn verify(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    do_stubbing(Kind::Verify, input.into()).into()
}

/// Simple function-level tracing.
///
/// A module that wants tracing defines a `const TRACE: bool` and
/// invokes `tracer!(TRACE, "function_name")` at the top of a
/// function.  This defines a local `t!` macro that formats like
/// `eprintln!`, prefixed with the function name, and compiles to
/// nothing when the flag is off.
macro_rules! tracer {
    ( $TRACE: expr, $func: expr ) => {
        // Currently, Rust doesn't support $( ... ) in a nested
        // macro's definition.  See:
        // https://users.rust-lang.org/t/nested-macros-issue/8348/2
        // Work around this using the "dollar trick": pass the `$`
        // token through as a `tt` fragment so the repetition below
        // isn't nested inside this macro's own expansion.
        tracer!(__dollar $TRACE, $func, $);
    };
    ( __dollar $TRACE: expr, $func: expr, $d: tt ) => {
        #[allow(unused_macros)]
        macro_rules! t {
            ( $d fmt: expr ) => {
                if $TRACE {
                    eprintln!("{}: {}", $func, $d fmt);
                }
            };
            ( $d fmt: expr, $d ($d arg: expr),* ) => {
                if $TRACE {
                    eprintln!("{}: {}", $func, format!($d fmt, $d ($d arg),*));
                }
            };
        }
    };
}

// Like assert!, but checks a pattern.
//
//   assert_match!(Some(_) = x);
//
// Note: For modules to see this macro, we need to define it before we
// declare the modules.
#[allow(unused_macros)]
macro_rules! assert_match {
    ( $error: pat = $expr:expr, $fmt:expr, $($pargs:expr),* ) => {{
        let x = $expr;
        if let $error = x {
            /* Pass.  */
        } else {
            let extra = format!($fmt, $($pargs),*);
            panic!("Expected {}, got {:?}{}{}",
                   stringify!($error), x,
                   if $fmt.len() > 0 { ": " } else { "." }, extra);
        }
    }};
    ( $error: pat = $expr: expr, $fmt:expr ) => {
        assert_match!($error = $expr, $fmt, );
    };
    ( $error: pat = $expr: expr ) => {
        assert_match!($error = $expr, "");
    };
}

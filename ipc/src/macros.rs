/// Simple function-level tracing, mirroring the core crate's
/// instrumentation: define a `const TRACE: bool` per module and call
/// `tracer!(TRACE, "function")` to get a local `t!` macro.
macro_rules! tracer {
    ( $TRACE: expr, $func: expr ) => {
        // Currently, Rust doesn't support $( ... ) in a nested
        // macro's definition.  See:
        // https://users.rust-lang.org/t/nested-macros-issue/8348/2
        #[allow(unused_macros)]
        macro_rules! t {
            ( $fmt: expr ) => {
                if $TRACE {
                    eprintln!("{}: {}", $func, $fmt);
                }
            };
            ( $fmt: expr, $($arg: expr),* ) => {
                if $TRACE {
                    eprintln!("{}: {}", $func, format!($fmt, $($arg),*));
                }
            };
        }
    };
}

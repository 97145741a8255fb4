//! A small handful of helper macros

#[cfg(test)]
use std::sync::atomic::AtomicBool;

#[cfg(test)]
pub(crate) static DEBUG: AtomicBool = AtomicBool::new(false);

#[cfg(test)]
macro_rules! enable_debug {
    () => {{
        $crate::macros::DEBUG.store(true, std::sync::atomic::Ordering::SeqCst);
    }};
}

#[cfg(test)]
macro_rules! disable_debug {
    () => {{
        $crate::macros::DEBUG.store(false, std::sync::atomic::Ordering::SeqCst);
    }};
}

macro_rules! debug_println {
    ($($args:tt)*) => {
        #[cfg(test)]
        {
            if $crate::macros::DEBUG.load(std::sync::atomic::Ordering::SeqCst) {
                println!($($args)*);
            }
        };
    };
}

// Assertion helpers for `Vector::validate`, reporting the path through the tree at which the
// failure occurred.
#[cfg(any(test, feature = "fuzz"))]
macro_rules! valid_assert {
    ($path:ident: $cond:expr) => {
        if !$cond {
            panic!(
                concat!("assertion failed: `", stringify!($cond), "` for path {:?}"),
                $path
            );
        }
    };
}

#[cfg(any(test, feature = "fuzz"))]
macro_rules! valid_assert_eq {
    ($path:ident: $lhs:expr, $rhs:expr) => {{
        let left = $lhs;
        let right = $rhs;
        if left != right {
            panic!(
                concat!(
                    "assertion failed: `",
                    stringify!($lhs == $rhs),
                    "` for path {:?}:\n",
                    " left: {:?}\n",
                    "right: {:?}",
                ),
                $path, left, right,
            );
        }
    }};
}

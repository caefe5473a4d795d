// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] trait representing per-scenario state.

use std::{fmt::Display, future::Future};

/// Represents a shared user-defined state for a test run.
/// It lives on per-scenario basis.
///
/// This crate doesn't provide out-of-box solution for managing state shared
/// across scenarios, because we want some friction there to avoid tests
/// being dependent on each other. If your workflow needs a way to share
/// state between scenarios (ex. database connection pool), we recommend
/// using a [`once_cell::sync::Lazy`] or organize it other way via
/// [shared state][1].
///
/// [1]: https://doc.rust-lang.org/book/ch16-03-shared-state.html
pub trait World: Sized + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Display;

    /// Creates a new [`World`] instance.
    fn new() -> impl Future<Output = Result<Self, Self::Error>>;
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[derive(Debug)]
    struct Counters {
        eaten: u64,
    }

    impl World for Counters {
        type Error = Infallible;

        async fn new() -> Result<Self, Self::Error> {
            Ok(Self { eaten: 0 })
        }
    }

    #[tokio::test]
    async fn fresh_world_per_call() {
        let mut world = Counters::new().await.unwrap();
        world.eaten += 3;

        let fresh = Counters::new().await.unwrap();
        assert_eq!(fresh.eaten, 0);
        assert_eq!(world.eaten, 3);
    }
}

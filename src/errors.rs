// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The two ways a render can be refused.  Once a configuration has
//! been accepted the computation itself cannot fail.

use failure::Fail;

/// Everything that can go wrong before the first iteration is run.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum RenderError {
    /// A size, iteration budget, thread count or colormap name that
    /// cannot be used.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfiguration(String),

    /// A rectangle of the complex plane that is inverted, empty, or
    /// not finite.
    #[fail(display = "invalid domain: {}", _0)]
    InvalidDomain(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = ::std::result::Result<T, RenderError>;

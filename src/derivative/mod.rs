//! # Derivatives
//!
//! Transform options, the token that encodes them, and the resolver that
//! turns a document plus options into a URL.
//!
//! Token grammar: `prefix+value` segments joined by `-`, e.g. `w300-q90`,
//! `f600x400-q70`, `c100x200-g1-q80`.

mod codec;
mod options;
mod resolver;

pub use codec::{OptionsCodec, PREFIXES};
pub use options::{derive_dimensions, NormalizedOptions, TransformOptions};
pub use resolver::{
    AddressStrategy, DerivativeAddressResolver, DerivativeStrategy, OriginalFileStrategy,
    UrlSettings,
};

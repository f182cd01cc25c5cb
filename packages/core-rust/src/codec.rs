//! Bidirectional codecs and codec chaining.
//!
//! A [`Codec`] is a pure transform between an input and an output
//! representation. Codecs hold no per-request state, so a single instance is
//! built once and shared across every request that needs it.

use crate::error::CodecError;

/// A stateless, bidirectional transform between two representations.
///
/// For lossless codecs `decode(encode(x)) == x` holds for every valid `x`.
pub trait Codec {
    /// The decoded (application-side) representation.
    type Input;
    /// The encoded (wire-side) representation.
    type Output;

    /// Encode an input value into its output representation.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the value cannot be represented.
    fn encode(&self, input: Self::Input) -> Result<Self::Output, CodecError>;

    /// Decode an output value back into its input representation.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the output is malformed.
    fn decode(&self, output: Self::Output) -> Result<Self::Input, CodecError>;

    /// Encode any value convertible into [`Codec::Input`].
    ///
    /// # Errors
    ///
    /// Same as [`Codec::encode`].
    fn encode_from<T>(&self, value: T) -> Result<Self::Output, CodecError>
    where
        T: Into<Self::Input>,
        Self: Sized,
    {
        self.encode(value.into())
    }

    /// Decode any value convertible into [`Codec::Output`].
    ///
    /// # Errors
    ///
    /// Same as [`Codec::decode`].
    fn decode_from<T>(&self, value: T) -> Result<Self::Input, CodecError>
    where
        T: Into<Self::Output>,
        Self: Sized,
    {
        self.decode(value.into())
    }

    /// Chain `next` after this codec.
    ///
    /// The resulting codec encodes through `self` then `next`, and decodes
    /// through `next` then `self`.
    fn chain<B>(self, next: B) -> Chain<Self, B>
    where
        Self: Sized,
        B: Codec<Input = Self::Output>,
    {
        Chain::new(self, next)
    }
}

/// Two codecs composed end to end. Built with [`Codec::chain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    /// Compose `first` (I -> L) with `second` (L -> O).
    pub const fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// The stage applied first on encode.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The stage applied first on decode.
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> Codec for Chain<A, B>
where
    A: Codec,
    B: Codec<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn encode(&self, input: Self::Input) -> Result<Self::Output, CodecError> {
        let intermediate = self.first.encode(input)?;
        self.second.encode(intermediate)
    }

    fn decode(&self, output: Self::Output) -> Result<Self::Input, CodecError> {
        let intermediate = self.second.decode(output)?;
        self.first.decode(intermediate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

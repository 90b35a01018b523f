//! Wire types for the two API surfaces bridged by gembridge.
//!
//! `openai` holds the downstream (client-facing) shapes, `gemini` the upstream ones.
//! Only the fields the translator reads or writes are modelled; unknown fields are
//! ignored on input.

pub mod gemini;
pub mod openai;

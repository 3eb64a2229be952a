// SPDX-License-Identifier: Apache-2.0

//! The Subscription/Callback Dispatcher: normalizes raw channel
//! callbacks into `Event`s and decides, per binding, whether a change
//! is worth an output row. The two-phase related-value pattern and
//! bit-decoder expansion are post-processing stages the Run Controller
//! applies to an already-normalized `Event`; the dispatcher itself
//! stays ignorant of them.

pub mod bit_decoder;
pub mod change_filter;
pub mod event;
pub mod related_value;

pub use bit_decoder::{expand as expand_bit_decoder, BitDecoderResolver};
pub use change_filter::{decide, ChangeFilterConfig, Decision, RequiredChange};
pub use event::{Event, Payload};
pub use related_value::{begin as begin_related_value, resolve as resolve_related_value, PendingRelatedValue};

// SPDX-License-Identifier: Apache-2.0

//! The Channel Layer: binding bookkeeping plus the
//! `ChannelProvider` trait abstracting the CA client library.

pub mod binding;
pub mod connect;
pub mod error;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use binding::{Binding, BindingId, BindingTable, ConnectionState, FieldKind, WaveformPayload};
pub use connect::{connect_and_discover, timeout_pseudo_event, FieldHint, DEFAULT_CONNECT_TIMEOUT};
pub use error::ChannelError;
pub use provider::{ChannelProvider, ConnectReport, RawCallback, RawValue, SubscriptionMask};

#[cfg(any(test, feature = "testing"))]
pub use mock::MockChannelProvider;

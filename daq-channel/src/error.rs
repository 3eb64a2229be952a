// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::binding::BindingId;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel '{name}' did not connect within {timeout_secs:.1}s")]
    ConnectTimeout { name: String, timeout_secs: f64 },

    #[error(
        "channel '{name}' declares ExpectFieldType=scalarArray but connected as a scalar"
    )]
    ExpectedWaveformGotScalar { name: String },

    #[error(
        "channel '{name}' waveform element count mismatch: expected {expected}, found {found}"
    )]
    ElementCountMismatch {
        name: String,
        expected: u32,
        found: u32,
    },

    #[error("transient CA error on binding {binding:?}: {detail}")]
    Transient { binding: BindingId, detail: String },

    #[error("unknown binding {0:?}")]
    UnknownBinding(BindingId),

    #[error("put rejected on binding {binding:?}: {detail}")]
    PutRejected { binding: BindingId, detail: String },
}

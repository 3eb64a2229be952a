// SPDX-License-Identifier: Apache-2.0

//! Resolves bit-decoder array lookups against the output
//! file's own parameters: a `BitDecoderArray` name on a request row
//! names a parameter-side string array in the *output* schema, not a
//! property of the request row itself.

use daq_dispatch::BitDecoderResolver;
use daq_table::{Layout, ParamValue};

pub struct WriterBitDecoderResolver<'a> {
    layout: &'a Layout,
    page_parameters: &'a std::collections::HashMap<String, ParamValue>,
}

impl<'a> WriterBitDecoderResolver<'a> {
    pub fn new(
        layout: &'a Layout,
        page_parameters: &'a std::collections::HashMap<String, ParamValue>,
    ) -> Self {
        Self {
            layout,
            page_parameters,
        }
    }
}

impl BitDecoderResolver for WriterBitDecoderResolver<'_> {
    fn describe_bit(&self, decoder_array: &str, bit: u32) -> Option<String> {
        let entry_name = format!("{decoder_array}[{bit}]");
        if self.layout.parameter(&entry_name).is_none() {
            return None;
        }
        self.page_parameters
            .get(&entry_name)
            .and_then(ParamValue::as_str)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_table::DataType;
    use std::collections::HashMap;

    #[test]
    fn resolves_decoder_entry_from_page_parameters() {
        let layout = Layout::new().with_parameter("FaultBits[0]", DataType::Str);
        let mut params = HashMap::new();
        params.insert(
            "FaultBits[0]".to_string(),
            ParamValue::Str("over-temperature".to_string()),
        );
        let resolver = WriterBitDecoderResolver::new(&layout, &params);
        assert_eq!(
            resolver.describe_bit("FaultBits", 0),
            Some("over-temperature".to_string())
        );
        assert_eq!(resolver.describe_bit("FaultBits", 1), None);
    }
}

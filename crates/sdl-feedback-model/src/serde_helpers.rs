// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer};

/// Remote rows may carry `null` for optional text columns.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

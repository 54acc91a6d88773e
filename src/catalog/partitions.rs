/// Key layout for catalog partitions
///
/// - `media`: media:{channel_id}\0{entry_id} -> MediaEntry (JSON)
/// - `storage_index`: sfid:{channel_id}\0{storage_file_id} -> entry_id
/// - `integrations`: integ:{integration_id} -> IntegrationRecord (JSON)
///
/// Ids are opaque provider/product strings and may contain ':' or '/', so the
/// channel id is terminated with NUL to keep prefixes unambiguous.

const SEP: char = '\0';

/// Encode a media key: media:{channel_id}\0{entry_id}
pub fn encode_media_key(channel_id: &str, entry_id: &str) -> Vec<u8> {
    format!("media:{}{}{}", channel_id, SEP, entry_id).into_bytes()
}

/// Encode the prefix of every media key of one channel
pub fn encode_media_prefix(channel_id: &str) -> Vec<u8> {
    format!("media:{}{}", channel_id, SEP).into_bytes()
}

/// Encode a uniqueness index key: sfid:{channel_id}\0{storage_file_id}
pub fn encode_index_key(channel_id: &str, storage_file_id: &str) -> Vec<u8> {
    format!("sfid:{}{}{}", channel_id, SEP, storage_file_id).into_bytes()
}

/// Encode an integration key: integ:{integration_id}
pub fn encode_integration_key(integration_id: &str) -> Vec<u8> {
    format!("integ:{}", integration_id).into_bytes()
}

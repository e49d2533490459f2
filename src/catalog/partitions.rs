/// Key layout for the catalog keyspace
///
/// Partition structure:
/// - `collections`: col:{id} -> Collection (JSON)
/// - `assets`: asset:{id} -> Asset (JSON, carries collection_id)
/// - `slots`: slot:{id} -> Slot (JSON)
/// - `settings`: setting:{key} -> value (UTF-8)
/// - `sent_log`: log:{seq:016} -> SentLogEntry (JSON)
/// - `metadata`: meta:{key} -> value

pub fn encode_collection_key(id: &str) -> Vec<u8> {
    format!("col:{}", id).into_bytes()
}

pub fn encode_asset_key(id: &str) -> Vec<u8> {
    format!("asset:{}", id).into_bytes()
}

pub fn encode_slot_key(id: &str) -> Vec<u8> {
    format!("slot:{}", id).into_bytes()
}

pub fn encode_setting_key(key: &str) -> Vec<u8> {
    format!("setting:{}", key).into_bytes()
}

/// Zero-padded so lexical order matches numeric order
pub fn encode_log_key(seq: u64) -> Vec<u8> {
    format!("log:{:016}", seq).into_bytes()
}

pub fn decode_log_key(key: &[u8]) -> Option<u64> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("log:")?.parse().ok()
}

pub fn encode_meta_key(key: &str) -> Vec<u8> {
    format!("meta:{}", key).into_bytes()
}

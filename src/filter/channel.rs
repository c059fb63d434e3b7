/// Map a channel identifier such as `/Traffic/Bus` to its collection name.
///
/// Only the first `/` is removed; the remainder is lower-cased. No character-set
/// validation happens here, so an empty result is possible and must be rejected
/// by the caller.
pub fn collection_from_channel(channel: &str) -> String {
    channel.replacen('/', "", 1).to_lowercase()
}

use super::catalog::GatewayRecord;

/// Records whose region prefix contains `current_topic`, in catalog order.
pub fn matching_records<'a>(
    catalog: &'a [GatewayRecord],
    current_topic: &str,
) -> Vec<&'a GatewayRecord> {
    catalog.iter().filter(|r| r.covers(current_topic)).collect()
}

/// Pick the gateway for `current_topic`.
///
/// Among prefix matches only the longest prefixes survive; `random_fn(n)`
/// must return an index in `0..n` and chooses within that group. Returns
/// `None` when no region contains the topic.
pub fn select_gateway<'a, F>(
    catalog: &'a [GatewayRecord],
    current_topic: &str,
    mut random_fn: F,
) -> Option<&'a GatewayRecord>
where
    F: FnMut(usize) -> usize,
{
    let matches = matching_records(catalog, current_topic);
    let longest = matches.iter().map(|r| r.topic.len()).max()?;
    let group: Vec<&GatewayRecord> = matches
        .into_iter()
        .filter(|r| r.topic.len() == longest)
        .collect();

    let index = random_fn(group.len()).min(group.len() - 1);
    group.get(index).copied()
}

use toml::{Table, Value};

/// Merge `overlay` into `base` in place. Tables present on both sides merge
/// key by key; any other value from `overlay` replaces what `base` had.
pub fn merge_into(base: &mut Table, overlay: Table) {
    for (key, incoming) in overlay {
        match (base.get_mut(&key), incoming) {
            (Some(Value::Table(existing)), Value::Table(sub)) => merge_into(existing, sub),
            (_, incoming) => {
                base.insert(key, incoming);
            }
        }
    }
}

/// Merge layers in order, the last one winning.
pub fn merge_layers(layers: impl IntoIterator<Item = Table>) -> Table {
    let mut merged = Table::new();
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}

/// Keys of `extra` absent from `base`, copied over. `base` wins on every
/// key it already has.
pub fn fill_missing(base: &mut Table, extra: &Table) {
    for (key, value) in extra {
        if !base.contains_key(key) {
            base.insert(key.clone(), value.clone());
        }
    }
}

//! Unit and property tests for the layer-ordered stack

use super::*;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    layer: Layer,
}

impl StackEntry for Entry {
    fn control_key(&self) -> &str {
        &self.key
    }

    fn layer(&self) -> Layer {
        self.layer
    }
}

fn entry(key: &str, layer: Layer) -> Entry {
    Entry {
        key: key.to_string(),
        layer,
    }
}

#[test]
fn test_new_stack_is_empty() {
    let stack: ViewStack<Entry> = ViewStack::new();
    assert!(stack.is_empty());
    assert_eq!(stack.len(), 0);
    assert!(stack.top().is_none());
    assert!(stack.bottom().is_none());
}

#[test]
fn test_push_orders_by_layer() {
    let mut stack = ViewStack::new();
    assert_eq!(stack.push(entry("dialog", Layer::Dialog)), Some(0));
    assert_eq!(stack.push(entry("bag", Layer::PopWindow)), Some(0));
    assert_eq!(stack.push(entry("hud", Layer::Main)), Some(0));
    assert_eq!(stack.push(entry("mail", Layer::PopWindow)), Some(2));

    assert_eq!(stack.keys(), vec!["hud", "bag", "mail", "dialog"]);
    assert_eq!(stack.top().map(|e| e.key.as_str()), Some("dialog"));
}

#[test]
fn test_push_duplicate_is_noop() {
    let mut stack = ViewStack::new();
    assert!(stack.push(entry("bag", Layer::PopWindow)).is_some());
    assert!(stack.push(entry("bag", Layer::Dialog)).is_none());

    assert_eq!(stack.len(), 1);
    assert_eq!(stack.get("bag").map(|e| e.layer), Some(Layer::PopWindow));
}

#[test]
fn test_remove_entry() {
    let mut stack = ViewStack::new();
    stack.push(entry("a", Layer::Main));
    stack.push(entry("b", Layer::Main));
    stack.push(entry("c", Layer::Main));

    assert_eq!(stack.remove("b").map(|e| e.key), Some("b".to_string()));
    assert_eq!(stack.keys(), vec!["a", "c"]);
    assert!(!stack.contains("b"));
    assert_eq!(stack.position("c"), Some(1));
    assert!(stack.remove("b").is_none());
}

#[test]
fn test_reinsert_moves_to_top_of_band() {
    let mut stack = ViewStack::new();
    stack.push(entry("a", Layer::PopWindow));
    stack.push(entry("b", Layer::PopWindow));
    stack.push(entry("tip", Layer::Tips));

    assert_eq!(stack.reinsert("a"), Some(1));
    assert_eq!(stack.keys(), vec!["b", "a", "tip"]);
    assert_eq!(stack.len(), 3);
    assert_eq!(stack.reinsert("ghost"), None);
}

#[test]
fn test_layer_positions_top_down() {
    let mut stack = ViewStack::new();
    stack.push(entry("hud", Layer::Main));
    stack.push(entry("a", Layer::PopWindow));
    stack.push(entry("b", Layer::PopWindow));
    stack.push(entry("tip", Layer::Tips));

    assert_eq!(stack.layer_positions(Layer::PopWindow), vec![2, 1]);
    assert!(stack.layer_positions(Layer::Modal).is_empty());
}

#[test]
fn test_at_out_of_range() {
    let mut stack = ViewStack::new();
    stack.push(entry("a", Layer::Main));
    assert!(stack.at(0).is_some());
    assert!(stack.at(1).is_none());
    assert!(stack.at_mut(7).is_none());
}

#[test]
fn test_position_consistency_after_operations() {
    let mut stack = ViewStack::new();
    stack.push(entry("a", Layer::Dialog));
    stack.push(entry("b", Layer::Main));
    stack.push(entry("c", Layer::PopWindow));
    stack.remove("b");
    stack.reinsert("a");

    for (i, e) in stack.iter().enumerate() {
        assert_eq!(stack.position(&e.key), Some(i));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Push(u8, usize),
    Remove(u8),
    Reinsert(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, 0usize..Layer::ALL.len()).prop_map(|(k, l)| Op::Push(k, l)),
        (0u8..8).prop_map(Op::Remove),
        (0u8..8).prop_map(Op::Reinsert),
    ]
}

proptest! {
    /// Sorted by layer, equal layers in recency order, one slot per key
    #[test]
    fn test_stack_invariants(ops in prop::collection::vec(op(), 0..64)) {
        let mut stack = ViewStack::new();
        // Recency stamp per key, mirrors what the stack should preserve
        let mut stamps = std::collections::HashMap::new();
        let mut clock = 0u32;

        for op in ops {
            match op {
                Op::Push(k, l) => {
                    let key = format!("w{}", k);
                    let before = stack.len();
                    let pushed = stack.push(entry(&key, Layer::ALL[l])).is_some();
                    if pushed {
                        clock += 1;
                        stamps.insert(key, clock);
                        prop_assert_eq!(stack.len(), before + 1);
                    } else {
                        prop_assert_eq!(stack.len(), before);
                    }
                }
                Op::Remove(k) => {
                    let key = format!("w{}", k);
                    if stack.remove(&key).is_some() {
                        stamps.remove(&key);
                    }
                }
                Op::Reinsert(k) => {
                    let key = format!("w{}", k);
                    let before = stack.len();
                    if stack.reinsert(&key).is_some() {
                        clock += 1;
                        stamps.insert(key, clock);
                    }
                    prop_assert_eq!(stack.len(), before);
                }
            }

            let entries: Vec<_> = stack.iter().collect();
            for pair in entries.windows(2) {
                prop_assert!(pair[0].layer <= pair[1].layer);
                if pair[0].layer == pair[1].layer {
                    prop_assert!(stamps[&pair[0].key] < stamps[&pair[1].key]);
                }
            }

            let mut keys = stack.keys();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), stack.len());
        }
    }
}

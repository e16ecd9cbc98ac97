use bincode::config::{BigEndian, Configuration, Limit, Varint};

/// Upper bound on the bytes a single decode may claim for containers.
pub const DECODE_LIMIT: usize = 1 << 30;

pub fn create_bincode_config() -> Configuration<BigEndian> {
    bincode::config::standard()
        .with_big_endian()
        .with_variable_int_encoding()
}

/// [`create_bincode_config`] with a claim limit, so a bogus length prefix
/// fails to decode instead of reserving memory for it.
pub fn create_decode_config() -> Configuration<BigEndian, Varint, Limit<DECODE_LIMIT>> {
    create_bincode_config().with_limit::<DECODE_LIMIT>()
}

pub mod test {
    use rand::prelude::*;

    use crate::node::ResourceNode;

    const NAMES: [&str; 6] = ["icon", "model", "tex", "anim", "sfx", "chr"];

    pub fn create_test_bytes(seed: u64) -> impl Iterator<Item = Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed);
        std::iter::repeat_with(move || random_payload(&mut rng))
    }

    fn random_payload(rng: &mut StdRng) -> Vec<u8> {
        let len = rng.random_range(0..10);
        (0..len).map(|_| rng.random_range(0..3) as u8).collect()
    }

    fn random_node(rng: &mut StdRng, name: String, depth: usize) -> ResourceNode {
        let mut node = ResourceNode::new(name, random_payload(rng));
        if depth == 0 {
            return node;
        }
        for _ in 0..rng.random_range(0..5) {
            // names repeat on purpose so duplicate siblings show up
            let name = NAMES.choose(rng).copied().unwrap_or("icon").to_string();
            node = node.with_child(random_node(rng, name, depth - 1));
        }
        node
    }

    /// A random tree up to four levels deep, with duplicate sibling names.
    pub fn create_test_tree(seed: u64) -> ResourceNode {
        let mut rng = StdRng::seed_from_u64(seed);
        random_node(&mut rng, "root".to_string(), 3)
    }

    /// A changed copy of `tree`: payloads rewritten, children dropped, and
    /// fresh subtrees inserted at random positions. Survivors keep their
    /// relative order and only the last of a run of same-named siblings is
    /// ever dropped, so the copy is reachable from `tree` through name-based
    /// matching.
    pub fn mutate_tree(tree: &ResourceNode, rng: &mut StdRng) -> ResourceNode {
        let mut counter = 0;
        mutate_node(tree, rng, &mut counter)
    }

    fn mutate_node(node: &ResourceNode, rng: &mut StdRng, counter: &mut usize) -> ResourceNode {
        let payload = if rng.random_bool(0.3) {
            random_payload(rng)
        } else {
            node.payload().to_vec()
        };
        let mut mutated = ResourceNode::new(node.name(), payload);
        let children = node.children();
        for (i, child) in children.iter().enumerate() {
            let last_of_name = children[i + 1..].iter().all(|c| c.name() != child.name());
            if last_of_name && rng.random_bool(0.15) {
                continue;
            }
            mutated = mutated.with_child(mutate_node(child, rng, counter));
        }
        if rng.random_bool(0.3) {
            for _ in 0..rng.random_range(1..3) {
                *counter += 1;
                let name = format!("added{}", counter);
                let depth = rng.random_range(0..2);
                let at = rng.random_range(0..=mutated.children().len());
                mutated.insert_child(random_node(rng, name, depth), at);
            }
        }
        mutated
    }
}

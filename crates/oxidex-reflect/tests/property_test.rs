//! Property-style tests over generated catalogs and arbitrary inputs.
//!
//! These check invariants across many shapes of hierarchy rather than single
//! scenarios, without pulling in a property-testing framework.

mod common;

use common::{init_logging, names, unique_name};
use oxidex_reflect::encoding::{parse_property_attributes, parse_signature};
use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder, TypeDescriptor};

/// Builds `roots` independent chains, each `depth` types deep.
fn chains(roots: usize, depth: usize) -> (Registry<InMemoryCatalog>, Vec<Vec<String>>) {
    let catalog = InMemoryCatalog::new();
    let mut all = Vec::new();
    for _ in 0..roots {
        let mut chain = Vec::new();
        let mut parent: Option<String> = None;
        for _ in 0..depth {
            let name = unique_name("Chain");
            let mut builder = TypeBuilder::new(&name).ivar("_slot", "q");
            if let Some(parent) = &parent {
                builder = builder.super_type(parent);
            }
            builder.register(&catalog).unwrap();
            chain.push(name.clone());
            parent = Some(name);
        }
        all.push(chain);
    }
    (Registry::new(catalog), all)
}

#[test]
fn test_resolve_returns_requested_name() {
    init_logging();
    for (roots, depth) in [(1, 1), (3, 4), (8, 2), (2, 16)] {
        let (registry, chains) = chains(roots, depth);
        for name in chains.iter().flatten() {
            let ty = registry.resolve_type(name).unwrap().unwrap();
            assert_eq!(ty.name(), name);
        }
    }
}

#[test]
fn test_ancestor_chain_matches_construction() {
    init_logging();
    for (roots, depth) in [(1, 1), (2, 5), (4, 12)] {
        let (registry, chains) = chains(roots, depth);
        for chain in &chains {
            for (idx, name) in chain.iter().enumerate() {
                let ty = registry.resolve_type(name).unwrap().unwrap();
                let ancestors: Vec<String> = registry
                    .ancestor_chain(&ty)
                    .unwrap()
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect();
                let expected: Vec<String> = chain[..idx].iter().rev().cloned().collect();
                assert_eq!(ancestors, expected);
            }
        }
    }
}

#[test]
fn test_instance_size_grows_down_the_chain() {
    init_logging();
    let (registry, chains) = chains(1, 6);
    let sizes: Vec<usize> = chains[0]
        .iter()
        .map(|name| registry.resolve_type(name).unwrap().unwrap().instance_size())
        .collect();
    assert_eq!(sizes, [8, 16, 24, 32, 40, 48]);
}

#[test]
fn test_enumeration_is_repeatable() {
    init_logging();
    for (roots, depth) in [(0, 0), (1, 3), (5, 5)] {
        let (registry, _) = chains(roots, depth);
        let first = registry.list_all_types_unfiltered().unwrap();
        let second = registry.list_all_types_unfiltered().unwrap();
        assert_eq!(first.len(), roots * depth * 2);
        assert_eq!(names(&first), names(&second));
    }
}

#[test]
fn test_predicate_partitions_enumeration() {
    init_logging();
    let (registry, _) = chains(3, 3);
    let all = registry.list_all_types_unfiltered().unwrap();
    let metas = registry.list_all_types(TypeDescriptor::is_meta).unwrap();
    let plain = registry.list_all_types(|ty| !ty.is_meta()).unwrap();
    assert_eq!(metas.len() + plain.len(), all.len());
    assert_eq!(metas.len(), plain.len());
}

#[test]
fn test_resolve_arbitrary_names() {
    init_logging();
    let (registry, _) = chains(1, 1);
    let inputs = [
        "x",
        "Chain",
        "chain_0",
        " Chain_0",
        "Chain_0 ",
        "Chain_0.Type.Type",
        "方法",
        "type🚀",
        "a:b:c:",
        "\0",
    ];
    for input in inputs {
        // Never an error for non-empty names, and nothing here is registered.
        let resolved = registry.resolve_type(input).unwrap();
        if let Some(ty) = resolved {
            assert_eq!(ty.name(), input);
        }
    }
}

#[test]
fn test_encoding_parsers_do_not_panic() {
    let inputs = [
        "",
        ",",
        ",,",
        "\"",
        "T",
        "T\"",
        "v",
        "v@",
        "v@:",
        "@:@:",
        "12345",
        "v@:🚀",
        "T@\"NSString\",C,N,V_name",
        "方法",
    ];
    for input in inputs {
        drop(parse_signature(input));
        drop(parse_property_attributes(input));
    }
}

//! Instruction-comparator scenarios: jump direction, switch shapes, and
//! lambda call-site unwrapping.

mod common;

use common::*;
use rematch::insn::{compare_insns, opcodes, RawConst, RawHandle, RawInsn};
use rematch::model::resolve::ResolveCache;
use rematch::prelude::*;

/// Builds one method per side and returns the stream similarity between them.
fn stream_similarity(insns_a: Vec<RawInsn>, insns_b: Vec<RawInsn>) -> f64 {
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("ja", PUBLIC)
            .with_method(MethodSpec::new("f", "()V", PUBLIC).with_insns(insns_a)),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("jb", PUBLIC)
            .with_method(MethodSpec::new("f", "()V", PUBLIC).with_insns(insns_b)),
    );
    let env = builder.build().expect("environment builds");
    let matches = env.create_matches();
    let cache = ResolveCache::new();

    let a = env.class_by_name(Side::A, "ja").unwrap();
    let b = env.class_by_name(Side::B, "jb").unwrap();
    let ma = env.class(a).find_method(&env, "f", "()V").unwrap();
    let mb = env.class(b).find_method(&env, "f", "()V").unwrap();
    compare_insns(&env, &matches, &cache, ma, mb)
}

#[test]
fn jump_direction_must_agree() {
    let forward = vec![nop(), ifeq(3), nop(), ret()];
    let backward = vec![nop(), ifeq(0), nop(), ret()];

    // Same opcode, opposite directions: the streams disagree.
    assert!(stream_similarity(forward.clone(), backward) < 1.0);
    // Two forward jumps with different absolute targets still agree.
    let forward_far = vec![nop(), ifeq(2), nop(), ret()];
    assert_eq!(stream_similarity(forward, forward_far), 1.0);
}

#[test]
fn table_switch_bounds_must_agree() {
    let switch_to = |high: i32| {
        let cases = (0..=high).map(|_| 1usize).collect::<Vec<_>>();
        vec![
            RawInsn::TableSwitch {
                low: 0,
                high,
                targets: cases,
                default: 1,
            },
            ret(),
        ]
    };

    assert!(stream_similarity(switch_to(9), switch_to(10)) < 1.0);
    assert_eq!(stream_similarity(switch_to(9), switch_to(9)), 1.0);
}

#[test]
fn lookup_switch_keys_must_agree() {
    let switch_with = |keys: Vec<i32>| {
        let targets = keys.iter().map(|_| 1usize).collect::<Vec<_>>();
        vec![
            RawInsn::LookupSwitch {
                keys,
                targets,
                default: 1,
            },
            ret(),
        ]
    };

    assert_eq!(
        stream_similarity(switch_with(vec![1, 5, 9]), switch_with(vec![1, 5, 9])),
        1.0
    );
    assert!(stream_similarity(switch_with(vec![1, 5, 9]), switch_with(vec![1, 5, 8])) < 1.0);
}

#[test]
fn iinc_compares_delta_not_slot() {
    let incr = |var: u16, delta: i32| vec![RawInsn::Iinc { var, delta }, ret()];

    // Different local slots, same increment: equal.
    assert_eq!(stream_similarity(incr(1, 5), incr(3, 5)), 1.0);
    // Same slot, different increment: mismatch.
    assert!(stream_similarity(incr(1, 5), incr(1, 6)) < 1.0);
}

#[test]
fn local_variable_indices_are_ignored() {
    let load = |var: u16| {
        vec![
            RawInsn::Var {
                op: opcodes::ILOAD,
                var,
            },
            ret(),
        ]
    };
    assert_eq!(stream_similarity(load(0), load(4)), 1.0);
}

const METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;\
Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;\
Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)\
Ljava/lang/invoke/CallSite;";

fn metafactory() -> RawHandle {
    RawHandle {
        tag: rematch::insn::HandleTag::InvokeStatic,
        owner: "java/lang/invoke/LambdaMetafactory".to_owned(),
        name: "metafactory".to_owned(),
        desc: METAFACTORY_DESC.to_owned(),
        interface: false,
    }
}

fn lambda_insn(owner: &str, impl_name: &str) -> RawInsn {
    let impl_handle = RawHandle {
        tag: rematch::insn::HandleTag::InvokeStatic,
        owner: owner.to_owned(),
        name: impl_name.to_owned(),
        desc: "()V".to_owned(),
        interface: false,
    };
    RawInsn::InvokeDynamic {
        name: "run".to_owned(),
        desc: "()Ljava/lang/Runnable;".to_owned(),
        bootstrap: metafactory(),
        args: vec![
            RawConst::MethodType("()V".to_owned()),
            RawConst::MethodHandle(impl_handle),
            RawConst::MethodType("()V".to_owned()),
        ],
    }
}

#[test]
fn lambda_implementations_compare_by_target() {
    // Each side's lambda points at its own obfuscated static implementation
    // method; the targets are potentially equal, so the call sites agree.
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("la", PUBLIC)
            .with_method(MethodSpec::new("a", "()V", PUBLIC | STATIC).with_insns(vec![ret()]))
            .with_method(
                MethodSpec::new("f", "()V", PUBLIC).with_insns(vec![
                    lambda_insn("la", "a"),
                    ret(),
                ]),
            ),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("lb", PUBLIC)
            .with_method(MethodSpec::new("b", "()V", PUBLIC | STATIC).with_insns(vec![ret()]))
            .with_method(
                MethodSpec::new("f", "()V", PUBLIC).with_insns(vec![
                    lambda_insn("lb", "b"),
                    ret(),
                ]),
            ),
    );
    let env = builder.build().expect("environment builds");
    let matches = env.create_matches();
    let cache = ResolveCache::new();

    let a = env.class_by_name(Side::A, "la").unwrap();
    let b = env.class_by_name(Side::B, "lb").unwrap();
    let fa = env.class(a).find_method(&env, "f", "()V").unwrap();
    let fb = env.class(b).find_method(&env, "f", "()V").unwrap();
    assert_eq!(compare_insns(&env, &matches, &cache, fa, fb), 1.0);
}

#[test]
fn bodiless_methods_compare_vacuously_equal() {
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("na", PUBLIC).with_method(MethodSpec::new("f", "()V", PUBLIC | 0x0400)),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("nb", PUBLIC).with_method(MethodSpec::new("f", "()V", PUBLIC | 0x0400)),
    );
    let env = builder.build().expect("environment builds");
    let matches = env.create_matches();
    let cache = ResolveCache::new();

    let a = env.class_by_name(Side::A, "na").unwrap();
    let b = env.class_by_name(Side::B, "nb").unwrap();
    let fa = env.class(a).find_method(&env, "f", "()V").unwrap();
    let fb = env.class(b).find_method(&env, "f", "()V").unwrap();
    assert_eq!(compare_insns(&env, &matches, &cache, fa, fb), 1.0);
}

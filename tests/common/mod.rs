//! Shared fixture helpers for the integration suites.
//!
//! Fixtures are built through the public `EnvBuilder` API, the same way the
//! parser collaborator feeds the engine.

#![allow(dead_code)]

use rematch::insn::opcodes;
use rematch::prelude::*;

/// ACC_PUBLIC
pub const PUBLIC: u16 = 0x0001;
/// ACC_STATIC
pub const STATIC: u16 = 0x0008;
/// ACC_FINAL
pub const FINAL: u16 = 0x0010;

/// Builds the environment and runs the matcher to fixpoint with a small
/// fixed-size pool (tests must not depend on host parallelism).
pub fn run(builder: EnvBuilder) -> (MatchEnv, Matches, MatchingStats) {
    run_with(builder, MatcherConfig::default())
}

/// Same as [`run`] with an explicit configuration.
pub fn run_with(
    builder: EnvBuilder,
    config: MatcherConfig,
) -> (MatchEnv, Matches, MatchingStats) {
    let _ = env_logger::builder().is_test(true).try_init();
    let env = builder.build().expect("environment builds");
    let mut matches = env.create_matches();
    let matcher = Matcher::new(config.with_threads(2)).expect("matcher constructs");
    let stats = matcher.run(&env, &mut matches).expect("engine runs");
    (env, matches, stats)
}

/// Returns the matched partner's name for a real class of group A.
pub fn class_partner(env: &MatchEnv, matches: &Matches, name: &str) -> Option<String> {
    let a = env.class_by_name(Side::A, name)?;
    matches
        .class_match(a)
        .map(|b| env.class(b).name.clone())
}

/// Returns the matched partner of a method, as `(owner, name, desc)`.
pub fn method_partner(
    env: &MatchEnv,
    matches: &Matches,
    class: &str,
    name: &str,
    desc: &str,
) -> Option<(String, String, String)> {
    let c = env.class_by_name(Side::A, class)?;
    let m = env.class(c).find_method(env, name, desc)?;
    matches.method_match(m).map(|p| {
        let def = env.method(p);
        (
            env.class(def.owner).name.clone(),
            def.name.clone(),
            def.desc.clone(),
        )
    })
}

/// Returns the matched partner of a field, as `(owner, name)`.
pub fn field_partner(
    env: &MatchEnv,
    matches: &Matches,
    class: &str,
    name: &str,
    desc: &str,
) -> Option<(String, String)> {
    let c = env.class_by_name(Side::A, class)?;
    let f = env.class(c).find_field(env, name, desc)?;
    matches.field_match(f).map(|p| {
        let def = env.field(p);
        (env.class(def.owner).name.clone(), def.name.clone())
    })
}

/// Checks the symmetry, type-preservation, and reality invariants over every
/// real symbol of group A.
pub fn assert_invariants(env: &MatchEnv, matches: &Matches) {
    for &a in env.real_classes(Side::A) {
        if let Some(b) = matches.class_match(a) {
            assert_eq!(matches.class_match(b), Some(a), "class match symmetric");
            assert!(env.class(b).real, "real class matched a real class");
        }
    }
    for m in env.real_methods(Side::A) {
        if let Some(p) = matches.method_match(m) {
            assert_eq!(matches.method_match(p), Some(m), "method match symmetric");
        }
    }
    for f in env.real_fields(Side::A) {
        if let Some(p) = matches.field_match(f) {
            assert_eq!(matches.field_match(p), Some(f), "field match symmetric");
        }
    }
    for &s in env.shared_classes() {
        assert_eq!(matches.class_match(s), Some(s), "synthetic self-match");
    }
}

/// `return`
pub fn ret() -> RawInsn {
    RawInsn::Plain {
        op: opcodes::RETURN,
    }
}

/// `nop`
pub fn nop() -> RawInsn {
    RawInsn::Plain { op: opcodes::NOP }
}

/// `ldc <string>`
pub fn ldc_str(value: &str) -> RawInsn {
    RawInsn::Ldc {
        cst: RawConst::String(value.to_owned()),
    }
}

/// `bipush <value>`
pub fn bipush(value: i32) -> RawInsn {
    RawInsn::IntPush {
        op: opcodes::BIPUSH,
        value,
    }
}

/// A conditional branch.
pub fn ifeq(target: usize) -> RawInsn {
    RawInsn::Jump {
        op: opcodes::IFEQ,
        target,
    }
}

/// A static invoke.
pub fn invokestatic(owner: &str, name: &str, desc: &str) -> RawInsn {
    RawInsn::Method {
        op: opcodes::INVOKESTATIC,
        owner: owner.to_owned(),
        name: name.to_owned(),
        desc: desc.to_owned(),
        interface: false,
    }
}

/// A virtual invoke.
pub fn invokevirtual(owner: &str, name: &str, desc: &str) -> RawInsn {
    RawInsn::Method {
        op: opcodes::INVOKEVIRTUAL,
        owner: owner.to_owned(),
        name: name.to_owned(),
        desc: desc.to_owned(),
        interface: false,
    }
}

/// A static field read.
pub fn getstatic(owner: &str, name: &str, desc: &str) -> RawInsn {
    RawInsn::Field {
        op: opcodes::GETSTATIC,
        owner: owner.to_owned(),
        name: name.to_owned(),
        desc: desc.to_owned(),
    }
}

/// A static field write.
pub fn putstatic(owner: &str, name: &str, desc: &str) -> RawInsn {
    RawInsn::Field {
        op: opcodes::PUTSTATIC,
        owner: owner.to_owned(),
        name: name.to_owned(),
        desc: desc.to_owned(),
    }
}

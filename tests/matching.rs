//! End-to-end matching scenarios over synthetic class-group fixtures.
//!
//! Each test seeds a minimal pair of class groups through the public builder,
//! runs the engine to fixpoint, and checks the resulting pairings plus the
//! engine invariants (symmetry, reality, synthetic self-matches).

mod common;

use common::*;
use rematch::prelude::*;

#[test]
fn rename_only_pair_matches() {
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("A", PUBLIC)
            .with_method(MethodSpec::new("f", "()V", PUBLIC).with_insns(vec![ret()])),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("X", PUBLIC)
            .with_method(MethodSpec::new("f", "()V", PUBLIC).with_insns(vec![ret()])),
    );

    let (env, matches, stats) = run(builder);
    assert_invariants(&env, &matches);
    assert_eq!(class_partner(&env, &matches, "A").as_deref(), Some("X"));
    assert_eq!(
        method_partner(&env, &matches, "A", "f", "()V"),
        Some(("X".to_owned(), "f".to_owned(), "()V".to_owned()))
    );
    assert_eq!(stats.classes.matched, 1);
    assert_eq!(stats.methods.matched, 1);
}

#[test]
fn obfuscated_names_match_via_structure() {
    let method_body = vec![ldc_str("hello"), ret()];
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("aa", PUBLIC)
            .with_field(FieldSpec::new("s", "Ljava/lang/String;", PUBLIC))
            .with_method(MethodSpec::new("m", "()V", PUBLIC).with_insns(method_body.clone())),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("bb", PUBLIC)
            .with_field(FieldSpec::new("t", "Ljava/lang/String;", PUBLIC))
            .with_method(MethodSpec::new("n", "()V", PUBLIC).with_insns(method_body)),
    );

    let (env, matches, stats) = run(builder);
    assert_invariants(&env, &matches);
    assert_eq!(class_partner(&env, &matches, "aa").as_deref(), Some("bb"));
    assert_eq!(
        method_partner(&env, &matches, "aa", "m", "()V"),
        Some(("bb".to_owned(), "n".to_owned(), "()V".to_owned()))
    );
    assert_eq!(
        field_partner(&env, &matches, "aa", "s", "Ljava/lang/String;"),
        Some(("bb".to_owned(), "t".to_owned()))
    );
    assert_eq!(stats.fields.matched, 1);
}

#[test]
fn hierarchy_propagates_overridden_methods() {
    let build_side = |builder: &mut EnvBuilder, side: Side, sub_name: &str| {
        builder.add_class(
            side,
            ClassSpec::new("Parent", PUBLIC)
                .with_method(MethodSpec::new("g", "()V", PUBLIC).with_insns(vec![ret()])),
        );
        builder.add_class(
            side,
            ClassSpec::new(sub_name, PUBLIC)
                .extending("Parent")
                .with_method(
                    MethodSpec::new("g", "()V", PUBLIC).with_insns(vec![bipush(1), ret()]),
                ),
        );
    };
    let mut builder = EnvBuilder::new();
    build_side(&mut builder, Side::A, "ca");
    build_side(&mut builder, Side::B, "cb");

    let (env, matches, _) = run(builder);
    assert_invariants(&env, &matches);
    // Parent is seeded by its surviving name, the subclass matches on
    // structure, and both overrides of g end up paired.
    assert_eq!(
        class_partner(&env, &matches, "Parent").as_deref(),
        Some("Parent")
    );
    assert_eq!(class_partner(&env, &matches, "ca").as_deref(), Some("cb"));
    assert!(method_partner(&env, &matches, "ca", "g", "()V").is_some());
    assert!(method_partner(&env, &matches, "Parent", "g", "()V").is_some());
}

#[test]
fn conflicting_claims_leave_everyone_unmatched() {
    let body = vec![ldc_str("x"), ret()];
    let clone_class = |name: &str| {
        ClassSpec::new(name, PUBLIC)
            .with_method(MethodSpec::new("f", "()V", PUBLIC).with_insns(body.clone()))
    };
    let mut builder = EnvBuilder::new();
    // Two indistinguishable sources, one destination: both claim it, the
    // conflict drops all three for every pass, and the fixpoint leaves them
    // unmatched rather than guessing.
    builder.add_class(Side::A, clone_class("aa"));
    builder.add_class(Side::A, clone_class("ab"));
    builder.add_class(Side::B, clone_class("ba"));

    let (env, matches, stats) = run(builder);
    assert_invariants(&env, &matches);
    assert_eq!(class_partner(&env, &matches, "aa"), None);
    assert_eq!(class_partner(&env, &matches, "ab"), None);
    let b = env.class_by_name(Side::B, "ba").unwrap();
    assert_eq!(matches.class_match(b), None);
    assert_eq!(stats.classes.matched, 0);
    assert_eq!(stats.methods.matched, 0);
}

#[test]
fn empty_groups_yield_empty_match_set() {
    let (env, matches, stats) = run(EnvBuilder::new());
    assert_invariants(&env, &matches);
    assert_eq!(stats.classes.total, 0);
    assert_eq!(stats.methods.total, 0);
    assert_eq!(stats.fields.total, 0);
}

#[test]
fn synthetic_classes_self_match_only() {
    let mut builder = EnvBuilder::new();
    // One real class per side referencing platform types; the synthetics it
    // drags in must self-match and nothing else.
    builder.add_class(
        Side::A,
        ClassSpec::new("ua", PUBLIC).with_method(MethodSpec::new(
            "u",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            PUBLIC,
        )),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("ub", PUBLIC).with_method(MethodSpec::new(
            "v",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            PUBLIC,
        )),
    );

    let (env, matches, _) = run(builder);
    assert_invariants(&env, &matches);
    for &s in env.shared_classes() {
        assert_eq!(matches.class_match(s), Some(s));
    }
}

fn revision_fixture() -> EnvBuilder {
    let mut builder = EnvBuilder::new();
    for side in [Side::A, Side::B] {
        builder.add_class(
            side,
            ClassSpec::new("net/example/Client", PUBLIC)
                .with_method(
                    MethodSpec::new("run", "()V", PUBLIC).with_insns(vec![
                        ldc_str("booting"),
                        invokestatic("aa", "a", "()V"),
                        ret(),
                    ]),
                )
                .with_field(FieldSpec::new("tick", "I", PUBLIC)),
        );
        builder.add_class(
            side,
            ClassSpec::new("aa", PUBLIC)
                .with_method(
                    MethodSpec::new("a", "()V", PUBLIC | STATIC).with_insns(vec![
                        getstatic("aa", "b", "I"),
                        ifeq(3),
                        bipush(7),
                        ret(),
                    ]),
                )
                .with_field(
                    FieldSpec::new("b", "I", PUBLIC | STATIC)
                        .with_initializer(RawConst::Int(42)),
                ),
        );
    }
    builder
}

#[test]
fn identical_inputs_match_completely() {
    let (env, matches, stats) = run(revision_fixture());
    assert_invariants(&env, &matches);
    assert_eq!(stats.classes.matched, stats.classes.total);
    assert_eq!(stats.methods.matched, stats.methods.total);
    assert_eq!(stats.fields.matched, stats.fields.total);
    assert_eq!(
        class_partner(&env, &matches, "net/example/Client").as_deref(),
        Some("net/example/Client")
    );
    assert_eq!(class_partner(&env, &matches, "aa").as_deref(), Some("aa"));
}

#[test]
fn second_run_is_idempotent() {
    let env = revision_fixture().build().expect("environment builds");
    let matcher = Matcher::new(MatcherConfig::default().with_threads(2)).expect("matcher");
    let mut matches = env.create_matches();
    matcher.run(&env, &mut matches).expect("first run");
    let snapshot = matches.clone();

    matcher.run(&env, &mut matches).expect("second run");
    for &c in env.real_classes(Side::A).iter().chain(env.real_classes(Side::B)) {
        assert_eq!(matches.class_match(c), snapshot.class_match(c));
    }
    for m in env.real_methods(Side::A).chain(env.real_methods(Side::B)) {
        assert_eq!(matches.method_match(m), snapshot.method_match(m));
    }
    for f in env.real_fields(Side::A).chain(env.real_fields(Side::B)) {
        assert_eq!(matches.field_match(f), snapshot.field_match(f));
    }
}

#[test]
fn runs_are_deterministic() {
    let collect = || {
        let (env, matches, _) = run(revision_fixture());
        let mut pairs: Vec<(String, Option<String>)> = env
            .real_classes(Side::A)
            .iter()
            .map(|&c| {
                (
                    env.class(c).name.clone(),
                    matches.class_match(c).map(|b| env.class(b).name.clone()),
                )
            })
            .collect();
        pairs.sort();
        pairs
    };
    assert_eq!(collect(), collect());
}

#[test]
fn loose_configuration_matches_end_to_end() {
    // Bodies differ between the sides; the loose preset still pairs the
    // sole plausible candidate.
    let mut builder = EnvBuilder::new();
    builder.add_class(
        Side::A,
        ClassSpec::new("aa", PUBLIC)
            .with_method(MethodSpec::new("m", "()V", PUBLIC).with_insns(vec![ret()])),
    );
    builder.add_class(
        Side::B,
        ClassSpec::new("ba", PUBLIC).with_method(
            MethodSpec::new("n", "()V", PUBLIC).with_insns(vec![ldc_str("extra"), nop(), ret()]),
        ),
    );

    let (env, matches, _) = run_with(builder, MatcherConfig::loose());
    assert_invariants(&env, &matches);
    assert_eq!(class_partner(&env, &matches, "aa").as_deref(), Some("ba"));
}

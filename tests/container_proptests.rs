// Container property tests.
//
// Property 1: scalar state machine against std HashMap.
//  - Model: HashMap<i64, i64> holding only in-range keys/values.
//  - Operations: write, delete, read, contains, iterate, clear, with
//    keys/values occasionally outside the i32 range.
//  - Invariant: every result matches the model; out-of-range inputs are
//    TypeConversion errors and leave the model untouched.
//
// Property 2: managed reference accounting.
//  - Model: key -> object index.
//  - Operations: write, delete, read-and-drop, clear.
//  - Invariant: each object's strong count == 1 (test's own Rc) + number of
//    entries referencing it; trace visits == len.
use managed_intmap::{Container, ManagedRef, MapError, RcRuntime, TypeTag, Value};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Write(i64, i64),
    Delete(i64),
    Read(i64),
    Contains(i64),
    Iterate,
    Clear,
}

fn arb_key() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => -8i64..8,
        1 => Just(i64::from(i32::MAX) + 1),
        1 => Just(i64::from(i32::MIN) - 1),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_key(), arb_key()).prop_map(|(k, v)| Op::Write(k, v)),
        2 => arb_key().prop_map(Op::Delete),
        2 => arb_key().prop_map(Op::Read),
        1 => arb_key().prop_map(Op::Contains),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ]
}

fn fits_i32(v: i64) -> bool {
    i32::try_from(v).is_ok()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_scalar_matches_model(
        wide in any::<bool>(),
        ops in proptest::collection::vec(arb_op(), 1..80),
    ) {
        let (kt, vt) = if wide { (TypeTag::Int64, TypeTag::Int64) } else { (TypeTag::Int32, TypeTag::Int32) };
        let c: Container<RcRuntime<()>> = Container::new(kt, vt).unwrap();
        let mut model: HashMap<i64, i64> = HashMap::new();
        let fits = |v: i64| wide || fits_i32(v);

        for op in ops {
            match op {
                Op::Write(k, v) => {
                    let res = c.set(k, Value::Int(v));
                    if fits(k) && fits(v) {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(k, v);
                    } else {
                        let is_conversion = matches!(res, Err(MapError::TypeConversion { .. }));
                        prop_assert!(is_conversion);
                    }
                }
                Op::Delete(k) => {
                    let res = c.remove(k);
                    if !fits(k) {
                        let is_conversion = matches!(res, Err(MapError::TypeConversion { .. }));
                        prop_assert!(is_conversion);
                    } else if model.remove(&k).is_some() {
                        prop_assert_eq!(res, Ok(()));
                    } else {
                        prop_assert_eq!(res, Err(MapError::KeyNotFound(k)));
                    }
                }
                Op::Read(k) => {
                    let res = c.get(k);
                    if !fits(k) {
                        let is_conversion = matches!(res, Err(MapError::TypeConversion { .. }));
                        prop_assert!(is_conversion);
                    } else {
                        match model.get(&k) {
                            Some(v) => prop_assert_eq!(res, Ok(Value::Int(*v))),
                            None => prop_assert_eq!(res, Err(MapError::KeyNotFound(k))),
                        }
                    }
                }
                Op::Contains(k) => {
                    if fits(k) {
                        prop_assert_eq!(c.contains_key(k), Ok(model.contains_key(&k)));
                    }
                }
                Op::Iterate => {
                    let mut seen = BTreeSet::new();
                    for k in &c {
                        prop_assert!(seen.insert(k.unwrap()), "duplicate key from iterator");
                    }
                    let expected: BTreeSet<i64> = model.keys().copied().collect();
                    prop_assert_eq!(seen, expected);
                }
                Op::Clear => {
                    c.clear().unwrap();
                    model.clear();
                }
            }
            prop_assert_eq!(c.len(), model.len());
        }
    }
}

#[derive(Clone, Debug)]
enum ManagedOp {
    Write(i64, usize),
    Delete(i64),
    ReadAndDrop(i64),
    Clear,
}

fn arb_managed_op(objects: usize) -> impl Strategy<Value = ManagedOp> {
    prop_oneof![
        4 => (0i64..6, 0..objects).prop_map(|(k, o)| ManagedOp::Write(k, o)),
        2 => (0i64..6).prop_map(ManagedOp::Delete),
        2 => (0i64..6).prop_map(ManagedOp::ReadAndDrop),
        1 => Just(ManagedOp::Clear),
    ]
}

proptest! {
    #[test]
    fn prop_managed_counts_match_entries(
        ops in proptest::collection::vec(arb_managed_op(3), 1..60),
    ) {
        let objects: Vec<Rc<usize>> = (0..3).map(Rc::new).collect();
        let mut model: HashMap<i64, usize> = HashMap::new();
        {
            let c: Container<RcRuntime<usize>> = Container::new(TypeTag::Int32, TypeTag::Managed).unwrap();
            for op in ops {
                match op {
                    ManagedOp::Write(k, o) => {
                        c.set(k, ManagedRef::from_rc(&objects[o])).unwrap();
                        model.insert(k, o);
                    }
                    ManagedOp::Delete(k) => {
                        let existed = model.remove(&k).is_some();
                        prop_assert_eq!(c.remove(k).is_ok(), existed);
                    }
                    ManagedOp::ReadAndDrop(k) => {
                        if let Ok(v) = c.get(k) {
                            let r = v.into_object().unwrap().into_rc();
                            prop_assert_eq!(Some(*r), model.get(&k).copied());
                        } else {
                            prop_assert!(!model.contains_key(&k));
                        }
                    }
                    ManagedOp::Clear => {
                        c.clear().unwrap();
                        model.clear();
                    }
                }

                for (i, o) in objects.iter().enumerate() {
                    let refs = model.values().filter(|&&m| m == i).count();
                    prop_assert_eq!(Rc::strong_count(o), 1 + refs);
                }
                let mut visits = 0usize;
                c.trace(|_| -> Result<(), ()> { visits += 1; Ok(()) }).unwrap();
                prop_assert_eq!(visits, model.len());
            }
        }
        // Teardown released everything.
        for o in &objects {
            prop_assert_eq!(Rc::strong_count(o), 1);
        }
    }
}

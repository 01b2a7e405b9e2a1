//! Tests for the interpret module.

use std::cell::RefCell;
use std::rc::Rc;

use kestrel_ast::ast::BinaryOp;
use kestrel_ast::foundation::{DataType, FieldDecl, PrimitiveType, TypedConstant};

use super::*;

fn field(name: &str) -> Place {
    Place::FieldElement {
        field: name.to_string(),
        index: vec![],
    }
}

fn scalar_fields(names: &[&str]) -> FieldStorage {
    let mut fields = FieldStorage::new();
    for name in names {
        fields
            .declare(*name, FieldDecl::scalar(PrimitiveType::F32))
            .unwrap();
    }
    fields
}

fn kernel(body: Vec<Instr>, temp_count: u32) -> KernelIr {
    KernelIr {
        name: "test".to_string(),
        params: vec![],
        ret: None,
        body,
        temp_count,
    }
}

fn eval(dest: u32, value: LoweredExpr) -> Instr {
    Instr::Eval {
        dest: TempId(dest),
        value,
        ty: PrimitiveType::F32.into(),
    }
}

fn store(src: u32, place: Place) -> Instr {
    Instr::Store {
        src: TempId(src),
        place,
        cast: None,
    }
}

fn f32_at(fields: &FieldStorage, name: &str) -> f64 {
    fields.get(name, &[]).unwrap().as_scalar().unwrap().as_f64()
}

#[test]
fn test_two_phase_swap() {
    let mut fields = scalar_fields(&["a", "b"]);
    fields.set("a", &[], TypedConstant::f32(2.0).into()).unwrap();
    fields.set("b", &[], TypedConstant::f32(3.0).into()).unwrap();

    let ir = kernel(
        vec![
            eval(0, LoweredExpr::Load(field("b"))),
            eval(1, LoweredExpr::Load(field("a"))),
            store(0, field("a")),
            store(1, field("b")),
        ],
        2,
    );

    let mut functions = HostFunctions::new();
    Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap();

    assert_eq!(f32_at(&fields, "a"), 3.0);
    assert_eq!(f32_at(&fields, "b"), 2.0);
}

#[test]
fn test_store_with_cast() {
    let mut fields = scalar_fields(&["a"]);
    let ir = kernel(
        vec![
            Instr::Eval {
                dest: TempId(0),
                value: LoweredExpr::Const(TypedConstant::f64(7.9)),
                ty: PrimitiveType::F64.into(),
            },
            Instr::Store {
                src: TempId(0),
                place: Place::Local("x".to_string()),
                cast: Some(PrimitiveType::I32),
            },
            Instr::Return(LoweredExpr::Load(Place::Local("x".to_string()))),
        ],
        1,
    );
    let mut functions = HostFunctions::new();
    let result = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap();
    assert_eq!(result, Some(Value::Scalar(TypedConstant::i32(7))));
}

#[test]
fn test_calls_run_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut functions = HostFunctions::new();
    {
        let log = Rc::clone(&log);
        functions.register("tick", move |args: &[Value]| {
            let tag = args[0].as_scalar().map(|c| c.as_i64()).unwrap_or(-1);
            log.borrow_mut().push(tag);
            Ok(Value::Scalar(TypedConstant::i32(tag as i32)))
        });
    }

    let tick = |n: i32| LoweredExpr::Call {
        func: "tick".to_string(),
        args: vec![LoweredExpr::Const(TypedConstant::i32(n))],
    };
    let ir = kernel(
        vec![Instr::Eval {
            dest: TempId(0),
            value: LoweredExpr::Tuple(vec![tick(1), tick(2), tick(3)]),
            ty: DataType::Tuple(vec![]),
        }],
        1,
    );
    let mut fields = FieldStorage::new();
    Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap();
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_loop_and_return() {
    // s = 0; for i in 0..5 { s = s + i }; return s
    let s = || Place::Local("s".to_string());
    let ir = KernelIr {
        name: "sum".to_string(),
        params: vec![],
        ret: Some(PrimitiveType::I32.into()),
        body: vec![
            Instr::Eval {
                dest: TempId(0),
                value: LoweredExpr::Const(TypedConstant::i32(0)),
                ty: PrimitiveType::I32.into(),
            },
            store(0, s()),
            Instr::Loop {
                var: "i".to_string(),
                start: LoweredExpr::Const(TypedConstant::i32(0)),
                end: LoweredExpr::Const(TypedConstant::i32(5)),
                body: vec![
                    Instr::Eval {
                        dest: TempId(1),
                        value: LoweredExpr::Binary {
                            op: BinaryOp::Add,
                            ty: PrimitiveType::I32,
                            lhs: Box::new(LoweredExpr::Load(s())),
                            rhs: Box::new(LoweredExpr::Load(Place::Local("i".to_string()))),
                        },
                        ty: PrimitiveType::I32.into(),
                    },
                    store(1, s()),
                ],
            },
            Instr::Return(LoweredExpr::Load(s())),
        ],
        temp_count: 2,
    };
    let mut fields = FieldStorage::new();
    let mut functions = HostFunctions::new();
    let result = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap();
    assert_eq!(result, Some(Value::Scalar(TypedConstant::i32(10))));
}

#[test]
fn test_vector_component() {
    let vector = LoweredExpr::Vector(vec![
        LoweredExpr::Const(TypedConstant::i32(2)),
        LoweredExpr::Const(TypedConstant::i32(3)),
    ]);
    let ir = kernel(
        vec![Instr::Return(LoweredExpr::Component {
            base: Box::new(vector),
            index: 1,
        })],
        0,
    );
    let mut fields = FieldStorage::new();
    let mut functions = HostFunctions::new();
    let result = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap();
    assert_eq!(result, Some(Value::Scalar(TypedConstant::i32(3))));
}

#[test]
fn test_integer_division_by_zero() {
    let ir = kernel(
        vec![Instr::Return(LoweredExpr::Binary {
            op: BinaryOp::Div,
            ty: PrimitiveType::I32,
            lhs: Box::new(LoweredExpr::Const(TypedConstant::i32(1))),
            rhs: Box::new(LoweredExpr::Const(TypedConstant::i32(0))),
        })],
        0,
    );
    let mut fields = FieldStorage::new();
    let mut functions = HostFunctions::new();
    let err = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap_err();
    assert!(matches!(err, InterpretError::DivisionByZero));
}

#[test]
fn test_argument_count_checked() {
    let mut ir = kernel(vec![], 0);
    ir.params.push(("n".to_string(), PrimitiveType::I32.into()));
    let mut fields = FieldStorage::new();
    let mut functions = HostFunctions::new();
    let err = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        InterpretError::ArgumentCount {
            expected: 1,
            actual: 0,
            ..
        }
    ));
}

#[test]
fn test_unevaluated_temp_is_an_error() {
    let mut fields = scalar_fields(&["a"]);
    let ir = kernel(vec![store(0, field("a"))], 1);
    let mut functions = HostFunctions::new();
    let err = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap_err();
    assert!(matches!(err, InterpretError::UnknownTemp(TempId(0))));
}

#[test]
fn test_unknown_host_function() {
    let ir = kernel(
        vec![Instr::Return(LoweredExpr::Call {
            func: "missing".to_string(),
            args: vec![],
        })],
        0,
    );
    let mut fields = FieldStorage::new();
    let mut functions = HostFunctions::new();
    let err = Interpreter::new(&mut fields, &mut functions)
        .run(&ir, &[])
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown host function 'missing'");
}

// AnyBox / TraitBox integration tests.
//
// Invariants exercised:
// - Casts succeed only for the exact concrete type; mismatches raise
//   IncompatibleType naming both types, nil boxes raise NilDereference.
// - cast_ref shares the payload and bumps the count.
// - Errors raised through the `Error` interface keep their message.
use rt_core::{
    impl_mask, panic_error, recover, AnyBox, ErrorKind, ErrorValue, Map, Ref, RuntimeError, Str,
    TraitBox,
};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
struct NotFound {
    path: Str,
}

impl ErrorValue for NotFound {
    fn error(&self) -> Str {
        Str::from("not found: ") + &self.path
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotFound({})", self.path)
    }
}

impl_mask!(dyn ErrorValue: NotFound);

trait Named: Send + Sync {
    fn name(&self) -> Str;
}

#[derive(Clone, Debug, PartialEq)]
struct User {
    id: i64,
}

impl Named for User {
    fn name(&self) -> Str {
        Str::from(format!("user{}", self.id))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User#{}", self.id)
    }
}

impl_mask!(dyn Named: User);

// Test: an integer boxed as any does not cast to a string.
#[test]
fn int_to_str_cast_is_incompatible() {
    let b = AnyBox::new(5i64);
    assert_eq!(b.cast::<i64>(), 5);
    let err = b.try_cast::<Str>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleType);
    let msg = err.to_string();
    assert!(msg.contains("i64"), "{msg}");
    assert!(msg.contains("Str"), "{msg}");

    let err = recover(|| b.cast::<Str>()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleType);
}

// Test: nil boxes of both flavours.
#[test]
fn nil_boxes_raise_nil_dereference() {
    let any = AnyBox::nil();
    assert_eq!(any.try_cast::<i64>(), Err(RuntimeError::NilDereference));
    assert_eq!(any.to_string(), "<nil>");

    let named: TraitBox<dyn Named> = TraitBox::nil();
    let err = recover(|| named.name()).unwrap_err();
    assert_eq!(err, RuntimeError::NilDereference);
}

// Test: boxes held in a map keep their payloads shared.
#[test]
fn boxes_in_maps_share_payload() {
    let mut users: Map<Str, TraitBox<dyn Named>> = Map::new();
    let r = Ref::new(User { id: 7 });
    users.set(Str::from("seven"), TraitBox::from_ref(&r));
    assert_eq!(r.count(), 2);

    let b = users.get(b"seven".as_slice()).cloned().unwrap_or_default();
    assert_eq!(b.name(), "user7");
    let back = b.cast_ref::<User>();
    assert!(back.ptr_eq(&r));
    assert_eq!(r.count(), 4);

    users.clear();
    drop(b);
    drop(back);
    assert_eq!(r.count(), 1);
}

// Test: `Error` interface values through the panic channel.
#[test]
fn error_values_keep_their_message() {
    let err = recover(|| {
        panic_error(TraitBox::new(NotFound {
            path: Str::from("/etc/x"),
        }))
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserPanic);
    assert_eq!(err.to_string(), "not found: /etc/x");

    let value = err.into_error_value();
    assert!(value.is::<NotFound>());
    assert_eq!(value.cast::<NotFound>().path, "/etc/x");

    let wrapped = RuntimeError::DivideByZero.into_error_value();
    assert_eq!(wrapped.error(), "divide by zero");
}

// Test: any-box equality and reassignment.
#[test]
fn any_box_equality_and_assign() {
    let mut a = AnyBox::new(Str::from("x"));
    let b = AnyBox::new(Str::from("x"));
    assert_eq!(a, b);
    assert!(a.equals_value(&Str::from("x")));
    a.assign(1u8);
    assert_ne!(a, b);
    assert!(a.is::<u8>());
    a.clear();
    assert_eq!(a, AnyBox::nil());
}

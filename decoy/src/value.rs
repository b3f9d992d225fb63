// vim: tw=80
//! Dynamically typed payloads: the arguments and results that flow through a
//! mock.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::{
    any::{self, Any, TypeId},
    cell::{Ref, RefCell},
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

/// Runtime identity of a Rust type.  Plays the part of a constructor when
/// matching with [`it::is_any_object`](crate::it::is_any_object).
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeTag { id: TypeId::of::<T>(), name: any::type_name::<T>() }
    }

    /// Fully qualified name of the type
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type's name without its module path, unless it is generic
    pub fn short_name(&self) -> &'static str {
        if self.name.contains('<') {
            self.name
        } else {
            self.name.rsplit("::").next().unwrap_or(self.name)
        }
    }

    /// The tag of the `Value` variant's payload that values of this type are
    /// stored as.  Every integer type is carried as `i64`, every float as
    /// `f64`, and string-like types as `String`.  Other types carry
    /// themselves.
    pub(crate) fn carrier(self) -> TypeTag {
        let integers = [
            TypeId::of::<i8>(), TypeId::of::<i16>(), TypeId::of::<i32>(),
            TypeId::of::<isize>(), TypeId::of::<u8>(), TypeId::of::<u16>(),
            TypeId::of::<u32>(), TypeId::of::<u64>(), TypeId::of::<usize>(),
        ];
        let strings = [
            TypeId::of::<str>(), TypeId::of::<&'static str>(),
            TypeId::of::<char>(),
        ];
        if integers.contains(&self.id) {
            TypeTag::of::<i64>()
        } else if self.id == TypeId::of::<f32>() {
            TypeTag::of::<f64>()
        } else if strings.contains(&self.id) {
            TypeTag::of::<String>()
        } else {
            self
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

struct ObjectData {
    tag: TypeTag,
    fields: BTreeMap<String, Value>,
}

/// A shared, mutable record of named fields.
///
/// Cloning an `Object` yields another handle to the same record, so objects
/// may alias each other and form cycles.
///
/// # Examples
/// ```
/// # use decoy::*;
/// let a = Object::new().with("x", 1);
/// let b = a.clone();
/// b.set("x", 2);
/// assert_eq!(Some(Value::from(2)), a.get("x"));
/// ```
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    /// A plain object.  Its tag is `Object` itself.
    pub fn new() -> Self {
        Object::with_tag(TypeTag::of::<Object>())
    }

    /// An object that claims to be an instance of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Object::with_tag(TypeTag::of::<T>())
    }

    pub fn with_tag(tag: TypeTag) -> Self {
        Object(Rc::new(RefCell::new(ObjectData {
            tag,
            fields: BTreeMap::new()
        })))
    }

    /// Builder form of [`set`](#method.set)
    pub fn with<K, V>(self, key: K, value: V) -> Self
        where K: Into<String>, V: Into<Value>
    {
        self.set(key, value);
        self
    }

    /// Set a field, returning its previous value
    pub fn set<K, V>(&self, key: K, value: V) -> Option<Value>
        where K: Into<String>, V: Into<Value>
    {
        self.0.borrow_mut().fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().fields.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().fields.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().fields.is_empty()
    }

    pub fn tag(&self) -> TypeTag {
        self.0.borrow().tag
    }

    /// Are both handles to the very same record?
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A deep copy of this object's graph.  See [`Value::snapshot`].
    pub(crate) fn snapshot(&self) -> Object {
        snapshot_object(self, &mut HashMap::new())
    }

    /// Does this object carry every field of `shape`, each structurally
    /// equal?  Fields not named by `shape` are ignored.
    pub fn has_shape(&self, shape: &Object) -> bool {
        let mut stack = Vec::new();
        let candidate = self.fields();
        let shape = shape.fields();
        shape.iter().all(|(k, v)| {
            candidate.get(k).is_some_and(|c| eq_inner(v, c, &mut stack))
        })
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    fn fields(&self) -> Ref<'_, BTreeMap<String, Value>> {
        Ref::map(self.0.borrow(), |data| &data.fields)
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::new()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Object {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let object = Object::new();
        for (k, v) in map {
            object.set(k, v);
        }
        object
    }
}

/// An opaque Rust value.  Compared by identity, matched by type.
#[derive(Clone)]
pub struct Native {
    tag: TypeTag,
    inner: Rc<dyn Any>,
    debug: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Native {
    pub fn new<T: Any + fmt::Debug>(value: T) -> Self {
        Native {
            tag: TypeTag::of::<T>(),
            inner: Rc::new(value),
            debug: debug_native::<T>
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn ptr_eq(&self, other: &Native) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn debug_native<T>(value: &dyn Any, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where T: Any + fmt::Debug
{
    match value.downcast_ref::<T>() {
        Some(t) => fmt::Debug::fmt(t, f),
        None => f.write_str("<native>")
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.inner, f)
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.  What an unconfigured call returns.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(Object),
    Native(Native),
}

impl Value {
    /// Wrap an arbitrary Rust value
    pub fn native<T: Any + fmt::Debug>(value: T) -> Self {
        Value::Native(Native::new(value))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => exact_i64(*f),
            _ => None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None
        }
    }

    /// Borrow the Rust value inside a [`Value::Native`]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Native(n) => n.downcast_ref(),
            _ => None
        }
    }

    /// Runtime type of this value.  `Undefined` and `Null` have none.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Bool(_) => Some(TypeTag::of::<bool>()),
            Value::Int(_) => Some(TypeTag::of::<i64>()),
            Value::Float(_) => Some(TypeTag::of::<f64>()),
            Value::Str(_) => Some(TypeTag::of::<String>()),
            Value::List(_) => Some(TypeTag::of::<Vec<Value>>()),
            Value::Object(o) => Some(o.tag()),
            Value::Native(n) => Some(n.tag()),
        }
    }

    /// Short name of this value's variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Native(_) => "native",
        }
    }

    /// Structural equality.
    ///
    /// Objects are equal when their tags and fields are; cyclic graphs are
    /// handled.  Integers and floats compare numerically, and `NaN` equals
    /// itself.  Natives compare by identity.
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut stack = Vec::new();
        eq_inner(self, other, &mut stack)
    }

    /// A deep copy that shares nothing mutable with the original.  Aliasing
    /// and cycles within the graph are preserved.  Natives are shared.
    pub fn snapshot(&self) -> Value {
        let mut memo = HashMap::new();
        snapshot_inner(self, &mut memo)
    }
}

/// `f` as an `i64`, if it is a whole number within range
fn exact_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable, unlike i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn eq_inner(a: &Value, b: &Value, stack: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => {
            x == y || (x.is_nan() && y.is_nan())
        },
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
            exact_i64(*f) == Some(*i)
        },
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() &&
                x.iter().zip(y).all(|(x, y)| eq_inner(x, y, stack))
        },
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y, stack),
        (Value::Native(x), Value::Native(y)) => x.ptr_eq(y),
        _ => false
    }
}

fn objects_eq(x: &Object, y: &Object, stack: &mut Vec<(usize, usize)>) -> bool
{
    if x.ptr_eq(y) {
        return true;
    }
    // A pair already being compared further up is assumed equal
    let pair = (x.addr(), y.addr());
    if stack.contains(&pair) {
        return true;
    }
    if x.tag() != y.tag() {
        return false;
    }
    let xf = x.fields();
    let yf = y.fields();
    if xf.len() != yf.len() {
        return false;
    }
    stack.push(pair);
    let equal = xf.iter().all(|(k, v)| {
        yf.get(k).is_some_and(|w| eq_inner(v, w, stack))
    });
    stack.pop();
    equal
}

fn snapshot_inner(value: &Value, memo: &mut HashMap<usize, Object>) -> Value {
    match value {
        Value::List(items) => {
            Value::List(items.iter().map(|i| snapshot_inner(i, memo)).collect())
        },
        Value::Object(o) => Value::Object(snapshot_object(o, memo)),
        other => other.clone()
    }
}

fn snapshot_object(original: &Object, memo: &mut HashMap<usize, Object>)
    -> Object
{
    if let Some(copy) = memo.get(&original.addr()) {
        return copy.clone();
    }
    let copy = Object::with_tag(original.tag());
    memo.insert(original.addr(), copy.clone());
    let fields: Vec<(String, Value)> = original.fields().iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in fields {
        let v = snapshot_inner(&v, memo);
        copy.set(k, v);
    }
    copy
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.deep_eq(other)
    }
}

/// Render a value for diagnostics.  An object reference that was already
/// rendered is suppressed: left out of maps, `null` inside lists.
fn render(value: &Value, f: &mut fmt::Formatter<'_>, seen: &mut HashSet<usize>)
    -> fmt::Result
{
    match value {
        Value::Undefined => f.write_str("undefined"),
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{:?}", x),
        Value::Str(s) => write!(f, "{:?}", s),
        Value::List(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                if is_repeat(item, seen) {
                    f.write_str("null")?;
                } else {
                    render(item, f, seen)?;
                }
            }
            f.write_str("]")
        },
        Value::Object(o) => {
            seen.insert(o.addr());
            let tag = o.tag();
            if tag != TypeTag::of::<Object>() {
                write!(f, "{} ", tag.short_name())?;
            }
            f.write_str("{")?;
            let mut first = true;
            for (k, v) in o.fields().iter() {
                if is_repeat(v, seen) {
                    continue;
                }
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{:?}: ", k)?;
                render(v, f, seen)?;
            }
            f.write_str("}")
        },
        Value::Native(n) => write!(f, "{:?}", n),
    }
}

fn is_repeat(value: &Value, seen: &HashSet<usize>) -> bool {
    match value {
        Value::Object(o) => seen.contains(&o.addr()),
        _ => false
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, &mut HashSet::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(&Value::Object(self.clone()), f, &mut HashSet::new())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Serializes like the diagnostic rendering: repeated object references are
/// dropped, so cyclic graphs serialize without error.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S)
        -> Result<S::Ok, S::Error>
    {
        let seen = RefCell::new(HashSet::new());
        Tracked { value: self, seen: &seen }.serialize(serializer)
    }
}

struct Tracked<'a> {
    value: &'a Value,
    seen: &'a RefCell<HashSet<usize>>,
}

impl Tracked<'_> {
    fn child<'b>(&'b self, value: &'b Value) -> Tracked<'b> {
        Tracked { value, seen: self.seen }
    }
}

impl Serialize for Tracked<'_> {
    fn serialize<S: Serializer>(&self, serializer: S)
        -> Result<S::Ok, S::Error>
    {
        match self.value {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    if is_repeat(item, &self.seen.borrow()) {
                        seq.serialize_element(&())?;
                    } else {
                        seq.serialize_element(&self.child(item))?;
                    }
                }
                seq.end()
            },
            Value::Object(o) => {
                self.seen.borrow_mut().insert(o.addr());
                let fields = o.fields();
                let mut map = serializer.serialize_map(None)?;
                for (k, v) in fields.iter() {
                    if is_repeat(v, &self.seen.borrow()) {
                        continue;
                    }
                    map.serialize_entry(k, &self.child(v))?;
                }
                map.end()
            },
            Value::Native(n) => serializer.serialize_str(&format!("{:?}", n)),
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    }
}
value_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    match i64::try_from(i) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Float(i as f64)
                    }
                }
            }
        )*
    }
}
value_from_wide_int!(u64, usize, isize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Native> for Value {
    fn from(n: Native) -> Self {
        Value::Native(n)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Value::from).collect())
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(o: Option<T>) -> Self {
        match o {
            Some(t) => Value::from(t),
            None => Value::Null
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN))
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            },
            Json::Object(map) => Value::Object(Object::from(map)),
        }
    }
}

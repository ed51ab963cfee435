//! The embedded reflective runtime: the small registry of builtin classes
//! and static methods the dispatcher executes commands against.
//!
//! The "host runtime" this worker bridges to is modeled as an in-process
//! registry rather than an external process, which keeps the worker
//! self-contained and exercises every command end to end.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::DispatchError;
use crate::output::PrintSink;

/// The fixed, ordered list of built-in types addressable as virtual handles
/// `-1 .. -11`. Order is load-bearing: it is the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    Byte,
    Boolean,
    Short,
    Char,
    Int,
    Float,
    Long,
    Double,
    Object,
    Str,
    Class,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 11] = [
        BuiltinType::Byte,
        BuiltinType::Boolean,
        BuiltinType::Short,
        BuiltinType::Char,
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Long,
        BuiltinType::Double,
        BuiltinType::Object,
        BuiltinType::Str,
        BuiltinType::Class,
    ];

    /// Zero-based position in `ALL`, i.e. `-(index + 1)` is this type's
    /// virtual handle in type-reference position.
    pub const fn index(self) -> usize {
        match self {
            BuiltinType::Byte => 0,
            BuiltinType::Boolean => 1,
            BuiltinType::Short => 2,
            BuiltinType::Char => 3,
            BuiltinType::Int => 4,
            BuiltinType::Float => 5,
            BuiltinType::Long => 6,
            BuiltinType::Double => 7,
            BuiltinType::Object => 8,
            BuiltinType::Str => 9,
            BuiltinType::Class => 10,
        }
    }

    /// Whether this is one of the eight primitive types (as opposed to
    /// `Object`/`String`/`Class`, which are real reference types).
    pub const fn is_primitive(self) -> bool {
        self.index() < 8
    }

    /// The bare type name, as it appears in wire text and in a primitive
    /// `Class`'s canonical rendering.
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::Byte => "byte",
            BuiltinType::Boolean => "boolean",
            BuiltinType::Short => "short",
            BuiltinType::Char => "char",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Long => "long",
            BuiltinType::Double => "double",
            BuiltinType::Object => "java.lang.Object",
            BuiltinType::Str => "java.lang.String",
            BuiltinType::Class => "java.lang.Class",
        }
    }
}

/// A reflective value: either a stored reference (string, class, method) or
/// a primitive carried by value. Primitives are never identity-tracked by
/// the object table.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Byte(i8),
    Boolean(bool),
    Short(i16),
    Char(u16),
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Str(Rc<str>),
    Class(Class),
    Method(Method),
}

impl Value {
    /// Short name of this value's kind, for `TypeMismatch` error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Byte(_) => "byte",
            Value::Boolean(_) => "boolean",
            Value::Short(_) => "short",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "String",
            Value::Class(_) => "Class",
            Value::Method(_) => "Method",
        }
    }

    /// The canonical text rendering used both by `TO_STRING` and by the
    /// `Object` overload of the print surface.
    pub fn canonical_text(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Byte(v) => v.to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Char(v) => char::from_u32(*v as u32).unwrap_or('\u{FFFD}').to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format_java_like(*v as f64),
            Value::Long(v) => v.to_string(),
            Value::Double(v) => format_java_like(*v),
            Value::Str(v) => v.to_string(),
            Value::Class(c) => c.canonical_text(),
            Value::Method(m) => format!("{}.{}", m.owner, m.name),
        }
    }

    pub fn as_class(&self) -> Result<&Class, DispatchError> {
        match self {
            Value::Class(c) => Ok(c),
            other => Err(DispatchError::TypeMismatch {
                expected: "Class",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_method(&self) -> Result<&Method, DispatchError> {
        match self {
            Value::Method(m) => Ok(m),
            other => Err(DispatchError::TypeMismatch {
                expected: "Method",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_int(&self) -> Result<i32, DispatchError> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Byte(v) => Ok(*v as i32),
            Value::Short(v) => Ok(*v as i32),
            other => Err(DispatchError::TypeMismatch {
                expected: "int",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, DispatchError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(DispatchError::TypeMismatch {
                expected: "String",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, DispatchError> {
        match self {
            Value::Boolean(v) => Ok(*v),
            other => Err(DispatchError::TypeMismatch {
                expected: "boolean",
                actual: other.kind_name(),
            }),
        }
    }
}

/// Mimics `Double.toString`/`Float.toString` closely enough for our own
/// round-trip purposes: integral finite values always show a fractional
/// part.
pub(crate) fn format_java_like(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// A resolved static method: a fixed parameter-type signature and a native
/// implementation function.
#[derive(Debug)]
pub struct MethodDef {
    pub owner: String,
    pub name: String,
    pub param_types: Vec<BuiltinType>,
    pub func: NativeFn,
}

pub type Method = Rc<MethodDef>;
pub type NativeFn = fn(&[Value], &mut dyn PrintSink) -> Result<Value, DispatchError>;

/// A loaded or built-in class: a name plus the static methods it declares.
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub is_primitive: bool,
    pub static_methods: Vec<Method>,
}

pub type Class = Rc<ClassDef>;

impl ClassDef {
    pub fn canonical_text(&self) -> String {
        if self.is_primitive {
            self.name.clone()
        } else {
            format!("class {}", self.name)
        }
    }

    /// Find a static method by name and parameter-type signature.
    pub fn find_method(&self, name: &str, param_types: &[BuiltinType]) -> Option<&Method> {
        self.static_methods
            .iter()
            .find(|m| m.name == name && m.param_types.as_slice() == param_types)
    }
}

/// Maps a class back to the built-in type it represents, if any. Used when
/// matching `GET_METHOD` parameter-type handles against a method's
/// `Vec<BuiltinType>` signature.
pub fn builtin_type_of(class: &ClassDef) -> Option<BuiltinType> {
    BuiltinType::ALL.into_iter().find(|t| t.name() == class.name)
}

/// The registry of classes the worker knows how to load and invoke against.
/// Construction is eager and cheap; every class, once built, is reference
/// counted so repeated lookups by name preserve identity.
pub struct Registry {
    classes: HashMap<String, Class>,
    builtin_by_type: Vec<Class>,
}

impl Registry {
    pub fn new() -> Self {
        let mut classes = HashMap::new();

        let builtin_by_type: Vec<Class> = BuiltinType::ALL
            .iter()
            .map(|t| {
                Rc::new(ClassDef {
                    name: t.name().to_owned(),
                    is_primitive: t.is_primitive(),
                    static_methods: Vec::new(),
                })
            })
            .collect();

        // The reference types among the builtins double as their own named
        // class entries, so `GET_CLASS("java.lang.Object")` aliases the same
        // singleton as the virtual handle for `Object`.
        for t in BuiltinType::ALL {
            if !t.is_primitive() {
                classes.insert(t.name().to_owned(), builtin_by_type[t.index()].clone());
            }
        }

        classes.insert("java.lang.Math".to_owned(), math_class());
        classes.insert("java.lang.System".to_owned(), system_class());
        classes.insert("java.lang.Integer".to_owned(), integer_class());
        classes.insert("Console".to_owned(), console_class());

        Self {
            classes,
            builtin_by_type,
        }
    }

    pub fn load_class(&self, name: &str) -> Result<Class, DispatchError> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::ClassNotFound(name.to_owned()))
    }

    pub fn builtin(&self, t: BuiltinType) -> Class {
        self.builtin_by_type[t.index()].clone()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn native_method(
    owner: &str,
    name: &str,
    param_types: &[BuiltinType],
    func: NativeFn,
) -> Method {
    Rc::new(MethodDef {
        owner: owner.to_owned(),
        name: name.to_owned(),
        param_types: param_types.to_vec(),
        func,
    })
}

fn math_class() -> Class {
    use BuiltinType::Int;
    Rc::new(ClassDef {
        name: "java.lang.Math".to_owned(),
        is_primitive: false,
        static_methods: vec![
            native_method("java.lang.Math", "abs", &[Int], |args, _| {
                Ok(Value::Int(args[0].as_int()?.abs()))
            }),
            native_method("java.lang.Math", "max", &[Int, Int], |args, _| {
                Ok(Value::Int(args[0].as_int()?.max(args[1].as_int()?)))
            }),
            native_method("java.lang.Math", "min", &[Int, Int], |args, _| {
                Ok(Value::Int(args[0].as_int()?.min(args[1].as_int()?)))
            }),
        ],
    })
}

fn system_class() -> Class {
    Rc::new(ClassDef {
        name: "java.lang.System".to_owned(),
        is_primitive: false,
        static_methods: vec![native_method(
            "java.lang.System",
            "currentTimeMillis",
            &[],
            |_, _| {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?
                    .as_millis();
                Ok(Value::Long(millis as i64))
            },
        )],
    })
}

fn integer_class() -> Class {
    use BuiltinType::{Int, Str};
    Rc::new(ClassDef {
        name: "java.lang.Integer".to_owned(),
        is_primitive: false,
        static_methods: vec![
            native_method("java.lang.Integer", "toHexString", &[Int], |args, _| {
                Ok(Value::Str(Rc::from(format!("{:x}", args[0].as_int()?))))
            }),
            native_method("java.lang.Integer", "toString", &[Int], |args, _| {
                Ok(Value::Str(Rc::from(args[0].as_int()?.to_string())))
            }),
            native_method("java.lang.Integer", "parseInt", &[Str], |args, _| {
                args[0]
                    .as_str()?
                    .parse::<i32>()
                    .map(Value::Int)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))
            }),
        ],
    })
}

/// A small static class whose methods exist purely to drive text through
/// every overload of the print surface. There being no real `System.out`
/// field access without instance/field support, this is the bridge's own
/// stand-in entry point for it.
fn console_class() -> Class {
    use BuiltinType::{Boolean, Char, Double, Int, Str};
    Rc::new(ClassDef {
        name: "Console".to_owned(),
        is_primitive: false,
        static_methods: vec![
            native_method("Console", "print", &[Str], |args, sink| {
                sink.print_str(args[0].as_str()?)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "println", &[Str], |args, sink| {
                sink.println_str(args[0].as_str()?)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "println", &[], |_, sink| {
                sink.println().map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "printBoolean", &[Boolean], |args, sink| {
                sink.print_bool(args[0].as_bool()?)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "printChar", &[Char], |args, sink| {
                let code = match &args[0] {
                    Value::Char(c) => *c,
                    other => {
                        return Err(DispatchError::TypeMismatch {
                            expected: "char",
                            actual: other.kind_name(),
                        })
                    }
                };
                sink.print_char(code)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "printInt", &[Int], |args, sink| {
                sink.print_int(args[0].as_int()? as i64)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
            native_method("Console", "printDouble", &[Double], |args, sink| {
                let v = match &args[0] {
                    Value::Double(v) => *v,
                    other => {
                        return Err(DispatchError::TypeMismatch {
                            expected: "double",
                            actual: other.kind_name(),
                        })
                    }
                };
                sink.print_float(v)
                    .map_err(|e| DispatchError::Invocation(e.to_string()))?;
                Ok(Value::Null)
            }),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_same_class_twice_preserves_identity() {
        let registry = Registry::new();
        let a = registry.load_class("java.lang.Math").unwrap();
        let b = registry.load_class("java.lang.Math").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_class_is_an_error() {
        let registry = Registry::new();
        assert!(matches!(
            registry.load_class("no.such.Class"),
            Err(DispatchError::ClassNotFound(_))
        ));
    }

    #[test]
    fn math_class_renders_canonically() {
        let registry = Registry::new();
        let math = registry.load_class("java.lang.Math").unwrap();
        assert_eq!(math.canonical_text(), "class java.lang.Math");
    }

    #[test]
    fn primitive_builtin_renders_bare_name() {
        let registry = Registry::new();
        let int_class = registry.builtin(BuiltinType::Int);
        assert_eq!(int_class.canonical_text(), "int");
    }

    #[test]
    fn object_builtin_aliases_named_load() {
        let registry = Registry::new();
        let via_name = registry.load_class("java.lang.Object").unwrap();
        let via_virtual = registry.builtin(BuiltinType::Object);
        assert!(Rc::ptr_eq(&via_name, &via_virtual));
    }
}

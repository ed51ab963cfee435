//! Virtual-handle resolution: turning a signed handle into either a table
//! lookup, an inline primitive read off the wire, or a reference to a
//! built-in type.

use std::io::Read;

use crate::error::DispatchError;
use crate::object_table::ObjectTable;
use crate::runtime::{BuiltinType, Registry, Value};
use crate::wire;

/// Size of the inline-primitive band: virtual handles `-1..=-8`.
pub const INLINE_PRIMITIVE_COUNT: i32 = 8;

/// Number of built-in types (`byte` .. `Class`).
pub const BUILTIN_COUNT: i32 = BuiltinType::ALL.len() as i32;

/// Reserved sentinel for a `null`/void return, one past the last virtual
/// handle used in value position.
pub const NULL_HANDLE: i32 = -(INLINE_PRIMITIVE_COUNT + BUILTIN_COUNT + 1);

/// Resolve a handle appearing in **type-reference** position (the
/// parameter-type list of `GET_METHOD`): non-negative handles are looked up
/// in the table and must hold a `Class`; negative handles index the
/// built-in type table directly, unshifted.
pub fn resolve_type_ref(handle: i32, table: &ObjectTable, registry: &Registry) -> Result<Value, DispatchError> {
    if handle >= 0 {
        return table.resolve(handle).map(|v| v.clone());
    }
    let idx = -handle - 1;
    if (0..BUILTIN_COUNT).contains(&idx) {
        Ok(Value::Class(registry.builtin(BuiltinType::ALL[idx as usize])))
    } else {
        Err(DispatchError::InvalidHandle(handle))
    }
}

/// Resolve a handle appearing in **value** position (an `INVOKE_STATIC_METHOD`
/// argument, or the target of `TO_STRING`): non-negative handles are looked
/// up in the table; the inline-primitive band consumes further bytes off
/// `wire`; the built-in type band is shifted down by the inline-primitive
/// band's width to avoid colliding with it; `NULL_HANDLE` denotes `null`.
pub fn resolve_value<R: Read>(
    handle: i32,
    table: &ObjectTable,
    registry: &Registry,
    wire: &mut R,
) -> Result<Value, DispatchError> {
    if handle >= 0 {
        return table.resolve(handle).map(|v| v.clone());
    }
    if handle == NULL_HANDLE {
        return Ok(Value::Null);
    }
    let inline_code = -handle;
    if (1..=INLINE_PRIMITIVE_COUNT).contains(&inline_code) {
        return read_inline_primitive(inline_code, wire);
    }
    let shifted = inline_code - INLINE_PRIMITIVE_COUNT;
    if (1..=BUILTIN_COUNT).contains(&shifted) {
        let idx = (shifted - 1) as usize;
        return Ok(Value::Class(registry.builtin(BuiltinType::ALL[idx])));
    }
    Err(DispatchError::InvalidHandle(handle))
}

fn read_inline_primitive<R: Read>(code: i32, wire_in: &mut R) -> Result<Value, DispatchError> {
    Ok(match code {
        1 => Value::Byte((wire::read_fixed_int(wire_in)? & 0xFF) as u8 as i8),
        2 => Value::Boolean(wire::read_fixed_int(wire_in)? != 0),
        3 => Value::Short((wire::read_fixed_int(wire_in)? & 0xFFFF) as u16 as i16),
        4 => Value::Char((wire::read_fixed_int(wire_in)? & 0xFFFF) as u16),
        5 => Value::Int(wire::read_fixed_int(wire_in)? as i32),
        6 => Value::Float(f32::from_bits(wire::read_fixed_int(wire_in)?)),
        7 => {
            let hi = wire::read_fixed_int(wire_in)? as u64;
            let lo = wire::read_fixed_int(wire_in)? as u64;
            Value::Long(((hi << 32) | lo) as i64)
        }
        8 => {
            let hi = wire::read_fixed_int(wire_in)? as u64;
            let lo = wire::read_fixed_int(wire_in)? as u64;
            Value::Double(f64::from_bits((hi << 32) | lo))
        }
        _ => unreachable!("caller already range-checked the inline-primitive band"),
    })
}

//! The request dispatcher: the two-state loop that reads one command at a
//! time, executes it against the object table and runtime registry, and
//! writes the corresponding result frame.

use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::config::Config;
use crate::error::{DispatchError, WireError};
use crate::handle;
use crate::object_table::ObjectTable;
use crate::output::OutputInterceptor;
use crate::runtime::{builtin_type_of, Registry, Value};
use crate::wire::{self, Command, ResultTag};

/// What a successfully executed command needs written as its terminal
/// frame. `PRINT_OUT` frames are written eagerly during execution and never
/// appear here.
enum Outcome {
    Int(i32),
    Void,
    Str(String),
}

/// Owns the object table and the reflective registry for the lifetime of the
/// worker process.
pub struct Dispatcher {
    table: ObjectTable,
    registry: Registry,
    config: Config,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self {
            table: ObjectTable::new(),
            registry: Registry::new(),
            config,
        }
    }

    /// Run the Running/Shutting-down loop to completion. Returns once a
    /// terminal `SHUTDOWN` frame has been written. I/O failures on the
    /// output stream are fatal and propagate; failures while parsing or
    /// executing a command body are caught and reported as `ERROR_RESULT`.
    pub fn run<R: Read, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        loop {
            let command = Command::read(input)?;
            if command == Command::Shutdown {
                break;
            }

            if self.config.debug {
                tracing::info!(command = command.name(), "debug: dispatching command");
            }
            tracing::trace!(command = command.name(), "dispatching command");

            match self.execute(command, input, output) {
                Ok(outcome) => write_outcome(output, &outcome)?,
                Err(err) => {
                    tracing::warn!(kind = err.kind(), error = %err, "command failed");
                    write_error(output, &err.to_string())?;
                }
            }
        }

        ResultTag::Shutdown.write(output)?;
        output.flush()?;
        tracing::info!("worker shutting down");
        Ok(())
    }

    fn execute<R: Read, W: Write>(
        &mut self,
        command: Command,
        input: &mut R,
        output: &mut W,
    ) -> Result<Outcome, DispatchError> {
        match command {
            Command::Shutdown => unreachable!("filtered out by the caller"),

            Command::GetClass => {
                let name = wire::read_text(input)?;
                let class = self.registry.load_class(&name)?;
                Ok(Outcome::Int(self.table.admit(Value::Class(class))))
            }

            Command::FreeObject => {
                let handle = read_handle(input)?;
                self.table.free(handle)?;
                Ok(Outcome::Void)
            }

            Command::GetMethod => {
                let owner_handle = read_handle(input)?;
                let owner_class = self.table.resolve(owner_handle)?.as_class()?.clone();
                let name = wire::read_text(input)?;
                let arity = wire::read_fixed_int(input)? as usize;

                let mut param_types = Vec::with_capacity(arity);
                for _ in 0..arity {
                    let type_handle = read_handle(input)?;
                    let type_value =
                        handle::resolve_type_ref(type_handle, &self.table, &self.registry)?;
                    let class = type_value.as_class()?;
                    let builtin = builtin_type_of(class).ok_or_else(|| DispatchError::TypeMismatch {
                        expected: "built-in parameter type",
                        actual: "non-built-in class",
                    })?;
                    param_types.push(builtin);
                }

                let method = owner_class
                    .find_method(&name, &param_types)
                    .cloned()
                    .ok_or_else(|| DispatchError::MethodNotFound {
                        owner: owner_class.name.clone(),
                        name: name.clone(),
                        arity,
                    })?;
                Ok(Outcome::Int(self.table.admit(Value::Method(method))))
            }

            Command::ToString => {
                let target = read_handle(input)?;
                let value = handle::resolve_value(target, &self.table, &self.registry, input)?;
                Ok(Outcome::Str(value.canonical_text()))
            }

            Command::CreateString => {
                let text = wire::read_text(input)?;
                Ok(Outcome::Int(self.table.admit(Value::Str(Rc::from(text)))))
            }

            Command::InvokeStaticMethod => {
                let method_handle = read_handle(input)?;
                let method = self.table.resolve(method_handle)?.as_method()?.clone();
                let arity = wire::read_fixed_int(input)? as usize;

                let mut args = Vec::with_capacity(arity);
                for _ in 0..arity {
                    let arg_handle = read_handle(input)?;
                    let value = handle::resolve_value(arg_handle, &self.table, &self.registry, input)?;
                    args.push(value);
                }

                if args.len() != method.param_types.len() {
                    return Err(DispatchError::MethodNotFound {
                        owner: method.owner.clone(),
                        name: method.name.clone(),
                        arity,
                    });
                }

                let mut sink = OutputInterceptor::new(output);
                let result = (method.func)(&args, &mut sink)?;
                // A `null`/void return is the reserved sentinel handle, never
                // a table slot.
                let handle = match result {
                    Value::Null => handle::NULL_HANDLE,
                    other => self.table.admit(other),
                };
                Ok(Outcome::Int(handle))
            }
        }
    }
}

fn read_handle<R: Read>(input: &mut R) -> Result<i32, WireError> {
    Ok(wire::read_fixed_int(input)? as i32)
}

fn write_outcome<W: Write>(output: &mut W, outcome: &Outcome) -> io::Result<()> {
    let mut frame = Vec::new();
    match outcome {
        Outcome::Int(v) => {
            ResultTag::IntResult.write(&mut frame)?;
            wire::write_fixed_int(&mut frame, *v as u32).map_err(wire_io_err)?;
        }
        Outcome::Void => {
            ResultTag::VoidResult.write(&mut frame)?;
        }
        Outcome::Str(s) => {
            ResultTag::StringResult.write(&mut frame)?;
            wire::write_text(&mut frame, s).map_err(wire_io_err)?;
        }
    }
    output.write_all(&frame)
}

fn write_error<W: Write>(output: &mut W, message: &str) -> io::Result<()> {
    let mut frame = Vec::new();
    ResultTag::ErrorResult.write(&mut frame)?;
    wire::write_text(&mut frame, message).map_err(wire_io_err)?;
    output.write_all(&frame)
}

fn wire_io_err(e: WireError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

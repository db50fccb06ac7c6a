//! Parsing of descriptors and generic signatures
//!
//! Descriptors (`(ILjava/lang/String;)V`) are a subset of the generic signature grammar, so both
//! go through the same parser. Uses of type variables are resolved against a scope of generic
//! parameters to fix their erasure; a variable the scope does not know erases to
//! `java/lang/Object`.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9.1

use super::{
    BaseType, BinaryName, ClassType, Error, GenericParameter, Name, RenderSignature,
    TypeArgument, TypeReference, UnqualifiedName,
};
use std::iter::Peekable;
use std::str::Chars;

/// Parsed method descriptor or method `Signature` attribute
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MethodSignature {
    pub generic_parameters: Vec<GenericParameter>,
    pub parameters: Vec<TypeReference>,

    /// `None` is for `void`
    pub return_type: Option<TypeReference>,

    pub thrown_types: Vec<TypeReference>,
}

impl MethodSignature {
    /// Parse a plain method descriptor, which may not mention any generics
    pub fn parse_descriptor(descriptor: &str) -> Result<MethodSignature, Error> {
        let signature = Self::parse(descriptor, &[])?;
        let is_generic = !signature.generic_parameters.is_empty()
            || !signature.thrown_types.is_empty()
            || signature.parameters.iter().any(TypeReference::is_generic)
            || signature.return_type.iter().any(TypeReference::is_generic);
        if is_generic {
            return Err(Error::MalformedSignature(format!(
                "Descriptor '{}' contains generic signature elements",
                descriptor
            )));
        }
        Ok(signature)
    }

    /// Parse a method signature, with `scope` holding the type parameters of enclosing classes
    pub fn parse(signature: &str, scope: &[GenericParameter]) -> Result<MethodSignature, Error> {
        let mut parser = SignatureParser::new(signature, scope);
        let parsed = parser.method_signature()?;
        parser.finish()?;
        Ok(parsed)
    }
}

impl RenderSignature for MethodSignature {
    fn append_signature(&self, write_to: &mut String) {
        if !self.generic_parameters.is_empty() {
            write_to.push('<');
            for generic_parameter in &self.generic_parameters {
                generic_parameter.append_signature(write_to);
            }
            write_to.push('>');
        }
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.append_signature(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.append_signature(write_to),
        }
        for thrown in &self.thrown_types {
            write_to.push('^');
            thrown.append_signature(write_to);
        }
    }

    /// Erased form is exactly the method descriptor
    fn append_erased_signature(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.append_erased_signature(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.append_erased_signature(write_to),
        }
    }
}

/// Parse a single field descriptor or field type signature
pub fn parse_field_type(
    source: &str,
    scope: &[GenericParameter],
) -> Result<TypeReference, Error> {
    let mut parser = SignatureParser::new(source, scope);
    let parsed = parser.field_type()?;
    parser.finish()?;
    Ok(parsed)
}

/// Parse a class name as it appears in a `CONSTANT_Class` entry
///
/// These are binary names (`java/lang/String`), except for array classes which use descriptor
/// syntax (`[Ljava/lang/String;`).
pub fn parse_class_constant(source: &str) -> Result<TypeReference, Error> {
    if source.starts_with('[') {
        parse_field_type(source, &[])
    } else {
        BinaryName::from_string(source.to_string())
            .map(TypeReference::object)
            .map_err(Error::MalformedSignature)
    }
}

struct SignatureParser<'s> {
    source: &'s str,
    chars: Peekable<Chars<'s>>,

    /// Type variables in scope, along with their erasure (innermost last)
    scope: Vec<(UnqualifiedName, BinaryName)>,
}

impl<'s> SignatureParser<'s> {
    fn new(source: &'s str, scope: &[GenericParameter]) -> SignatureParser<'s> {
        SignatureParser {
            source,
            chars: source.chars().peekable(),
            scope: scope
                .iter()
                .map(|param| (param.name.clone(), param.erasure()))
                .collect(),
        }
    }

    fn error(&self, msg: impl AsRef<str>) -> Error {
        Error::MalformedSignature(format!("{} in '{}'", msg.as_ref(), self.source))
    }

    fn expect(&mut self, expected: char) -> Result<(), Error> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("Expected '{}' but found '{}'", expected, c))),
            None => Err(self.error(format!("Expected '{}' but input ended", expected))),
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        match self.chars.next() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("Unexpected leftover input '{}'", c))),
        }
    }

    /// Read characters up to (not including) any of the `stop` characters
    fn identifier(&mut self, stop: &[char]) -> Result<String, Error> {
        let mut ident = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if stop.contains(&c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error("Expected an identifier"));
        }
        Ok(ident)
    }

    fn unqualified_name(&mut self, stop: &[char]) -> Result<UnqualifiedName, Error> {
        let ident = self.identifier(stop)?;
        UnqualifiedName::from_string(ident).map_err(|msg| self.error(msg))
    }

    fn method_signature(&mut self) -> Result<MethodSignature, Error> {
        let generic_parameters = if self.chars.peek() == Some(&'<') {
            self.generic_parameters()?
        } else {
            vec![]
        };

        self.expect('(')?;
        let mut parameters = vec![];
        while self.chars.peek() != Some(&')') {
            parameters.push(self.field_type()?);
        }
        self.expect(')')?;

        let return_type = if self.chars.peek() == Some(&'V') {
            self.chars.next();
            None
        } else {
            Some(self.field_type()?)
        };

        let mut thrown_types = vec![];
        while self.chars.next_if_eq(&'^').is_some() {
            match self.chars.peek().copied() {
                Some('L') | Some('T') => thrown_types.push(self.field_type()?),
                _ => return Err(self.error("Expected class or type variable after '^'")),
            }
        }

        Ok(MethodSignature {
            generic_parameters,
            parameters,
            return_type,
            thrown_types,
        })
    }

    /// Parameters enter scope once the whole list is parsed
    ///
    /// A bound may mention a parameter declared after it (`<T:TU;U:Ljava/lang/Number;>`), so
    /// erasures inside the list are only settled at the end.
    fn generic_parameters(&mut self) -> Result<Vec<GenericParameter>, Error> {
        self.expect('<')?;
        let mut parameters = vec![];
        while self.chars.next_if_eq(&'>').is_none() {
            let name = self.unqualified_name(&[':'])?;
            self.expect(':')?;
            let class_bound = match self.chars.peek().copied() {
                Some('L') | Some('T') | Some('[') => Some(self.field_type()?),
                _ => None,
            };
            let mut interface_bounds = vec![];
            while self.chars.next_if_eq(&':').is_some() {
                interface_bounds.push(self.field_type()?);
            }
            parameters.push(GenericParameter {
                name,
                class_bound,
                interface_bounds,
            });
        }
        if parameters.is_empty() {
            return Err(self.error("Empty type parameter list"));
        }

        let erasures = erase_parameters(&parameters);
        for parameter in &mut parameters {
            let bounds = parameter
                .class_bound
                .iter_mut()
                .chain(parameter.interface_bounds.iter_mut());
            for bound in bounds {
                set_variable_erasures(bound, &erasures);
            }
        }
        self.scope.extend(erasures);
        Ok(parameters)
    }

    fn field_type(&mut self) -> Result<TypeReference, Error> {
        match self.chars.peek().copied() {
            Some('L') => Ok(TypeReference::Class(self.class_type()?)),
            Some('T') => {
                self.chars.next();
                let name = self.unqualified_name(&[';'])?;
                self.expect(';')?;
                let erasure = match self.scope.iter().rev().find(|(n, _)| n == &name) {
                    Some((_, erasure)) => erasure.clone(),
                    None => {
                        log::debug!("Type variable {} is not in scope, erasing to Object", name);
                        BinaryName::OBJECT
                    }
                };
                Ok(TypeReference::variable(name, erasure))
            }
            Some('[') => {
                self.chars.next();
                Ok(TypeReference::array(self.field_type()?))
            }
            Some(c) => match BaseType::from_descriptor_char(c) {
                Some(base) => {
                    self.chars.next();
                    Ok(TypeReference::Primitive(base))
                }
                None => Err(self.error(format!("Invalid type character '{}'", c))),
            },
            None => Err(self.error("Missing field type")),
        }
    }

    fn class_type(&mut self) -> Result<ClassType, Error> {
        self.expect('L')?;
        let name = self.identifier(&['<', '.', ';'])?;
        let name = BinaryName::from_string(name).map_err(|msg| self.error(msg))?;
        let mut class = ClassType {
            name,
            arguments: self.type_arguments()?,
            outer: None,
        };

        // Inner classes selected from a parameterized outer class
        while self.chars.next_if_eq(&'.').is_some() {
            let simple_name = self.identifier(&['<', '.', ';'])?;
            let name = class.name.nested(&simple_name);
            class = ClassType {
                name,
                arguments: self.type_arguments()?,
                outer: Some(Box::new(class)),
            };
        }

        self.expect(';')?;
        Ok(class)
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>, Error> {
        let mut arguments = vec![];
        if self.chars.next_if_eq(&'<').is_none() {
            return Ok(arguments);
        }
        while self.chars.next_if_eq(&'>').is_none() {
            let argument = match self.chars.peek().copied() {
                Some('*') => {
                    self.chars.next();
                    TypeArgument::Wildcard
                }
                Some('+') => {
                    self.chars.next();
                    TypeArgument::Extends(self.field_type()?)
                }
                Some('-') => {
                    self.chars.next();
                    TypeArgument::Super(self.field_type()?)
                }
                Some(_) => TypeArgument::Exact(self.field_type()?),
                None => return Err(self.error("Unterminated type arguments")),
            };
            arguments.push(argument);
        }
        if arguments.is_empty() {
            return Err(self.error("Empty type argument list"));
        }
        Ok(arguments)
    }
}

/// Erasure of each parameter in a type parameter list
///
/// A parameter bounded by another parameter of the same list erases to that parameter's erasure.
/// Cycles are illegal in Java, so following at most `parameters.len()` links is enough.
fn erase_parameters(parameters: &[GenericParameter]) -> Vec<(UnqualifiedName, BinaryName)> {
    let position = |name: &UnqualifiedName| parameters.iter().rposition(|p| &p.name == name);

    let mut erasures: Vec<BinaryName> = parameters.iter().map(GenericParameter::erasure).collect();
    for _ in 0..parameters.len() {
        for (index, parameter) in parameters.iter().enumerate() {
            let first_bound = parameter
                .class_bound
                .iter()
                .chain(parameter.interface_bounds.iter())
                .next();
            if let Some(TypeReference::Variable(variable)) = first_bound {
                if let Some(bound_index) = position(&variable.name) {
                    erasures[index] = erasures[bound_index].clone();
                }
            }
        }
    }

    parameters
        .iter()
        .map(|parameter| parameter.name.clone())
        .zip(erasures)
        .collect()
}

/// Update the erasure of every use of the given type variables
fn set_variable_erasures(typ: &mut TypeReference, erasures: &[(UnqualifiedName, BinaryName)]) {
    match typ {
        TypeReference::Primitive(_) => (),
        TypeReference::Array(element) => set_variable_erasures(element, erasures),
        TypeReference::Variable(variable) => {
            if let Some((_, erasure)) = erasures.iter().rev().find(|(n, _)| n == &variable.name) {
                variable.erasure = erasure.clone();
            }
        }
        TypeReference::Class(class) => set_class_erasures(class, erasures),
    }
}

fn set_class_erasures(class: &mut ClassType, erasures: &[(UnqualifiedName, BinaryName)]) {
    for argument in &mut class.arguments {
        match argument {
            TypeArgument::Wildcard => (),
            TypeArgument::Extends(typ) | TypeArgument::Super(typ) | TypeArgument::Exact(typ) => {
                set_variable_erasures(typ, erasures)
            }
        }
    }
    if let Some(outer) = &mut class.outer {
        set_class_erasures(outer, erasures);
    }
}

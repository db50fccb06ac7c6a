use super::class_file::{Attribute, CodeAttribute};
use super::class_graph::MethodResolver;
use super::signatures::MethodSignature;
use super::{
    Error, GenericParameter, MethodAccessFlags, Name, RenderSignature, TypeReference,
    UnqualifiedName,
};
use std::fmt;

/// Parameter of a method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ParameterDefinition {
    /// Index of the parameter in the parameter list (not its local variable slot)
    pub position: usize,

    /// Source name, if known (eg. from a `MethodParameters` attribute)
    pub name: Option<UnqualifiedName>,

    pub parameter_type: TypeReference,
}

impl ParameterDefinition {
    /// Unnamed parameters for each of the types, in order
    pub fn from_types(types: Vec<TypeReference>) -> Vec<ParameterDefinition> {
        types
            .into_iter()
            .enumerate()
            .map(|(position, parameter_type)| ParameterDefinition {
                position,
                name: None,
                parameter_type,
            })
            .collect()
    }
}

/// Anything that identifies a method: both references to methods (eg. the target of an
/// `invokevirtual`) and the method definitions themselves.
///
/// Implementors supply the name, types, and declaring type; everything else is derived. Most
/// methods are neither generic nor declare thrown types, so those default to empty.
pub trait MethodReference {
    fn name(&self) -> &UnqualifiedName;

    /// Type the method is declared on (a free-floating reference has none)
    fn declaring_type(&self) -> Option<&TypeReference>;

    /// Return type, where `None` is `void`
    fn return_type(&self) -> Option<&TypeReference>;

    fn parameters(&self) -> &[ParameterDefinition];

    fn thrown_types(&self) -> &[TypeReference] {
        &[]
    }

    fn generic_parameters(&self) -> &[GenericParameter] {
        &[]
    }

    /// Is this the method definition itself (as opposed to a reference to it)?
    fn is_definition(&self) -> bool {
        false
    }

    fn has_parameters(&self) -> bool {
        !self.parameters().is_empty()
    }

    fn is_generic_method(&self) -> bool {
        !self.generic_parameters().is_empty()
    }

    fn is_generic_definition(&self) -> bool {
        self.is_generic_method() && self.is_definition()
    }

    /// Instance initializer (`<init>`)
    fn is_constructor(&self) -> bool {
        self.name() == &UnqualifiedName::INIT
    }

    /// Class initializer (`<clinit>`)
    fn is_type_initializer(&self) -> bool {
        self.name() == &UnqualifiedName::CLINIT
    }

    fn is_special_name(&self) -> bool {
        self.name().is_special()
    }

    /// Write `(` parameters `)` return type, keeping type arguments and type variables
    fn append_signature(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in self.parameters() {
            parameter.parameter_type.append_signature(write_to);
        }
        write_to.push(')');
        match self.return_type() {
            None => write_to.push('V'),
            Some(typ) => typ.append_signature(write_to),
        }
    }

    /// Write `(` parameters `)` return type, erasing every type
    ///
    /// This is the descriptor the JVM dispatches on: overrides that differ only in generic
    /// arguments share it.
    fn append_erased_signature(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in self.parameters() {
            parameter.parameter_type.append_erased_signature(write_to);
        }
        write_to.push(')');
        match self.return_type() {
            None => write_to.push('V'),
            Some(typ) => typ.append_erased_signature(write_to),
        }
    }

    fn signature(&self) -> String {
        let mut string = String::new();
        self.append_signature(&mut string);
        string
    }

    fn erased_signature(&self) -> String {
        let mut string = String::new();
        self.append_erased_signature(&mut string);
        string
    }

    /// `owner.name(descriptor)` form, for messages
    fn full_name(&self) -> String {
        let mut string = String::new();
        if let Some(class_name) = self.declaring_type().and_then(TypeReference::erased_class_name)
        {
            string.push_str(class_name.as_str());
            string.push('.');
        }
        string.push_str(self.name().as_str());
        self.append_erased_signature(&mut string);
        string
    }

    /// Find the definition of this method by asking the resolver to look it up on the declaring
    /// type
    ///
    /// A reference without a declaring type can never be resolved.
    fn resolve<'r, R>(&self, resolver: &'r R) -> Result<&'r MethodDefinition, Error>
    where
        Self: Sized,
        R: MethodResolver + ?Sized,
    {
        match self.declaring_type() {
            Some(declaring_type) => resolver.resolve_method(declaring_type, self),
            None => Err(Error::NotResolvable(format!(
                "{} has no declaring type",
                self.full_name()
            ))),
        }
    }
}

/// Reference to a method, as found in a `CONSTANT_Methodref` or a generic signature
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MethodRef {
    pub declaring_type: Option<TypeReference>,
    pub name: UnqualifiedName,
    pub parameters: Vec<ParameterDefinition>,
    pub return_type: Option<TypeReference>,
    pub generic_parameters: Vec<GenericParameter>,
}

impl MethodRef {
    pub fn new(
        declaring_type: Option<TypeReference>,
        name: UnqualifiedName,
        signature: MethodSignature,
    ) -> MethodRef {
        MethodRef {
            declaring_type,
            name,
            parameters: ParameterDefinition::from_types(signature.parameters),
            return_type: signature.return_type,
            generic_parameters: signature.generic_parameters,
        }
    }

    /// Reference from a name and a plain method descriptor
    pub fn from_descriptor(
        declaring_type: Option<TypeReference>,
        name: &str,
        descriptor: &str,
    ) -> Result<MethodRef, Error> {
        let name = UnqualifiedName::from_string(name.to_string()).map_err(Error::InvalidArgument)?;
        let signature = MethodSignature::parse_descriptor(descriptor)?;
        Ok(MethodRef::new(declaring_type, name, signature))
    }
}

impl MethodReference for MethodRef {
    fn name(&self) -> &UnqualifiedName {
        &self.name
    }

    fn declaring_type(&self) -> Option<&TypeReference> {
        self.declaring_type.as_ref()
    }

    fn return_type(&self) -> Option<&TypeReference> {
        self.return_type.as_ref()
    }

    fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    fn generic_parameters(&self) -> &[GenericParameter] {
        &self.generic_parameters
    }
}

/// Method declared by a class or interface
///
/// Owns its `Code` attribute exclusively. Abstract and native methods never carry bytecode.
#[derive(Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    declaring_type: TypeReference,
    name: UnqualifiedName,
    access_flags: MethodAccessFlags,
    parameters: Vec<ParameterDefinition>,
    return_type: Option<TypeReference>,
    generic_parameters: Vec<GenericParameter>,
    thrown_types: Vec<TypeReference>,
    body: Option<CodeAttribute>,

    /// Attributes other than `Code`
    attributes: Vec<Attribute>,
}

impl MethodDefinition {
    pub fn new(
        declaring_type: TypeReference,
        name: UnqualifiedName,
        access_flags: MethodAccessFlags,
        signature: MethodSignature,
    ) -> MethodDefinition {
        MethodDefinition {
            declaring_type,
            name,
            access_flags,
            parameters: ParameterDefinition::from_types(signature.parameters),
            return_type: signature.return_type,
            generic_parameters: signature.generic_parameters,
            thrown_types: signature.thrown_types,
            body: None,
            attributes: vec![],
        }
    }

    /// Assemble a method from what a class file provides
    ///
    /// The descriptor is authoritative for the number of parameters. The generic signature (from
    /// the `Signature` attribute, if any) is parsed in the scope of the class's type parameters
    /// and used unless it disagrees with the descriptor, which happens for the synthetic
    /// parameters of inner class and enum constructors. Thrown types come from the signature if
    /// it lists any, otherwise from the `Exceptions` attribute.
    pub fn from_class_file(
        declaring_type: TypeReference,
        class_generics: &[GenericParameter],
        name: &str,
        access_flags: MethodAccessFlags,
        descriptor: &str,
        generic_signature: Option<&str>,
        attributes: Vec<Attribute>,
    ) -> Result<MethodDefinition, Error> {
        let name = UnqualifiedName::from_string(name.to_string()).map_err(Error::InvalidArgument)?;
        let erased = MethodSignature::parse_descriptor(descriptor)?;

        let mut signature = match generic_signature {
            Some(generic) => {
                let parsed = MethodSignature::parse(generic, class_generics)?;
                if parsed.parameters.len() == erased.parameters.len() {
                    parsed
                } else {
                    log::debug!(
                        "Signature '{}' of {} does not match descriptor '{}', using descriptor",
                        generic,
                        name,
                        descriptor
                    );
                    MethodSignature {
                        thrown_types: parsed.thrown_types,
                        ..erased
                    }
                }
            }
            None => erased,
        };

        let mut body = None;
        let mut other_attributes = vec![];
        for attribute in attributes {
            match attribute {
                Attribute::Code(code) if body.is_none() => body = Some(*code),
                Attribute::Code(_) => {
                    return Err(Error::InvalidArgument(format!(
                        "method {} has more than one Code attribute",
                        name
                    )))
                }
                Attribute::Exceptions(exceptions) => {
                    if signature.thrown_types.is_empty() {
                        signature.thrown_types = exceptions.exception_types().to_vec();
                    }
                    other_attributes.push(Attribute::Exceptions(exceptions));
                }
                other => other_attributes.push(other),
            }
        }

        let mut method = MethodDefinition::new(declaring_type, name, access_flags, signature);
        method.attributes = other_attributes;
        match body {
            Some(code) => method.with_body(code),
            None => {
                if access_flags.expects_body() {
                    log::warn!("Method {} has no Code attribute", method.full_name());
                }
                Ok(method)
            }
        }
    }

    /// Attach the `Code` attribute
    ///
    /// Abstract and native methods only accept a shell without bytecode.
    pub fn with_body(mut self, code: CodeAttribute) -> Result<MethodDefinition, Error> {
        if code.has_code() && !self.access_flags.expects_body() {
            return Err(Error::InvalidArgument(format!(
                "{} method {} cannot have bytecode",
                if self.access_flags.contains(MethodAccessFlags::NATIVE) {
                    "native"
                } else {
                    "abstract"
                },
                self.full_name()
            )));
        }
        self.body = Some(code);
        Ok(self)
    }

    pub fn access_flags(&self) -> MethodAccessFlags {
        self.access_flags
    }

    /// The `Code` attribute, if the class file had one
    pub fn body(&self) -> Option<&CodeAttribute> {
        self.body.as_ref()
    }

    /// Is there bytecode to decompile?
    pub fn has_code(&self) -> bool {
        self.body.as_ref().map_or(false, CodeAttribute::has_code)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl MethodReference for MethodDefinition {
    fn name(&self) -> &UnqualifiedName {
        &self.name
    }

    fn declaring_type(&self) -> Option<&TypeReference> {
        Some(&self.declaring_type)
    }

    fn return_type(&self) -> Option<&TypeReference> {
        self.return_type.as_ref()
    }

    fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    fn thrown_types(&self) -> &[TypeReference] {
        &self.thrown_types
    }

    fn generic_parameters(&self) -> &[GenericParameter] {
        &self.generic_parameters
    }

    fn is_definition(&self) -> bool {
        true
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

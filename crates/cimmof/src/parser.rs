//! MOF Parser
//!
//! Recursive descent over the token stream. Each production builds its
//! object with the `cim` handles and hands it to the [`MofCompiler`] as
//! soon as it is complete; nothing is kept in an intermediate tree.

use cim::{CimName, CimType, Class, Flavor, Instance, Method, Parameter, Property, Qualifier, QualifierDecl, Scope};

use crate::driver::MofCompiler;
use crate::error::Result;
use crate::lexer::{SpannedToken, Token};
use crate::messages::MessageCode;
use crate::repository::Repository;
use crate::value::{parse_integer, Initializer, Literal, Shape};

/// A qualifier as written, before it is typed from its declaration
#[derive(Debug)]
struct QualifierSyntax {
    name: CimName,
    init: Option<Initializer>,
    flavor: Flavor,
}

/// Parser state
pub(crate) struct Parser<'c, R: Repository> {
    compiler: &'c mut MofCompiler<R>,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl<'c, R: Repository> Parser<'c, R> {
    pub(crate) fn new(compiler: &'c mut MofCompiler<R>, tokens: Vec<SpannedToken>) -> Self {
        Self {
            compiler,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn mark_at(&mut self, index: usize) {
        let (line, text) = match self.tokens.get(index) {
            Some(t) => (t.line, t.text.as_str()),
            None => (self.tokens.last().map_or(0, |t| t.line), ""),
        };
        self.compiler.context.set_position(line, text);
    }

    /// Point the context at the last token consumed
    fn mark(&mut self) {
        self.mark_at(self.pos.saturating_sub(1));
    }

    fn error(&mut self, message: &str) -> crate::error::MofError {
        self.mark_at(self.pos);
        self.compiler.syntax_error(message)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<()> {
        if self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.current() {
            Token::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error(&format!("expected {what}"))),
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<CimName> {
        let ident = self.expect_ident(what)?;
        CimName::new(&ident).map_err(|_| self.error(&format!("invalid {what}: {ident}")))
    }

    fn expect_alias(&mut self) -> Result<String> {
        match self.current() {
            Token::Alias(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("expected an alias")),
        }
    }

    fn expect_data_type(&mut self) -> Result<CimType> {
        match self.current() {
            Token::DataType(t) => {
                let t = *t;
                self.advance();
                Ok(t)
            }
            _ => Err(self.error("expected a data type")),
        }
    }

    /// One or more adjacent string literals, concatenated
    fn expect_string(&mut self) -> Result<String> {
        let mut out = match self.current() {
            Token::StringLiteral(s) => s.clone(),
            _ => return Err(self.error("expected a string")),
        };
        self.advance();
        while let Token::StringLiteral(s) = self.current() {
            out.push_str(s);
            self.advance();
        }
        Ok(out)
    }

    pub(crate) fn parse_file(&mut self) -> Result<()> {
        while *self.current() != Token::Eof {
            self.parse_production()?;
        }
        Ok(())
    }

    fn parse_production(&mut self) -> Result<()> {
        match self.current() {
            Token::Hash => self.parse_pragma(),
            Token::Qualifier => self.parse_qualifier_decl(),
            Token::Class => self.parse_class(Vec::new()),
            Token::Instance => self.parse_instance(Vec::new()),
            Token::LBracket => {
                let qualifiers = self.parse_qualifier_list()?;
                match self.current() {
                    Token::Class => self.parse_class(qualifiers),
                    Token::Instance => self.parse_instance(qualifiers),
                    _ => Err(self.error("expected class or instance after qualifier list")),
                }
            }
            _ => Err(self.error("expected a class, instance, qualifier or pragma")),
        }
    }

    // #pragma name("value")
    fn parse_pragma(&mut self) -> Result<()> {
        self.advance(); // Skip '#'
        let keyword = self.expect_ident("pragma")?;
        if !keyword.eq_ignore_ascii_case("pragma") {
            return Err(self.error("expected pragma"));
        }
        let name = self.expect_ident("pragma name")?;
        self.expect(&Token::LParen, "'('")?;
        let value = self.expect_string()?;
        self.expect(&Token::RParen, "')'")?;
        self.mark();
        self.compiler.pragma(&name, &value)
    }

    // qualifier Name : type[n] = value, scope(...), flavor(...);
    fn parse_qualifier_decl(&mut self) -> Result<()> {
        self.advance(); // Skip 'qualifier'
        let name = self.expect_name("qualifier name")?;
        self.expect(&Token::Colon, "':'")?;
        let cim_type = self.expect_data_type()?;
        let shape = self.parse_array_suffix()?;
        let init = self.parse_default_value()?;

        let mut scope = Scope::empty();
        let mut flavor = Flavor::empty();
        while *self.current() == Token::Comma {
            self.advance();
            let word = self.expect_ident("scope or flavor")?;
            if word.eq_ignore_ascii_case("scope") {
                scope |= self.parse_scope_list()?;
            } else if word.eq_ignore_ascii_case("flavor") {
                flavor |= self.parse_flavor_list()?;
            } else {
                return Err(self.error("expected scope or flavor"));
            }
        }
        self.expect(&Token::Semicolon, "';'")?;
        self.mark();

        if scope.is_empty() {
            scope = Scope::ANY;
        }
        let value = self.compiler.literal_value(cim_type, shape, &init)?;
        let array_size = match shape {
            Shape::Array(size) => size,
            Shape::Scalar => 0,
        };
        let qualifier_name = name.to_string();
        let decl = QualifierDecl::new(name, value, scope, flavor.resolve(Flavor::DEFAULTS), array_size);
        let decl = self
            .compiler
            .or_fatal(decl, MessageCode::AddQualifierError, &[&qualifier_name])?;
        self.compiler.add_qualifier_decl(decl)
    }

    fn parse_scope_list(&mut self) -> Result<Scope> {
        self.expect(&Token::LParen, "'('")?;
        let mut scope = Scope::empty();
        loop {
            let word = match self.current() {
                Token::Class => "class".to_string(),
                Token::Ident(s) => s.to_ascii_lowercase(),
                _ => return Err(self.error("expected a scope")),
            };
            scope |= match word.as_str() {
                "class" => Scope::CLASS,
                "association" => Scope::ASSOCIATION,
                "indication" => Scope::INDICATION,
                "property" => Scope::PROPERTY,
                "reference" => Scope::REFERENCE,
                "method" => Scope::METHOD,
                "parameter" => Scope::PARAMETER,
                "any" => Scope::ANY,
                _ => return Err(self.error("unknown scope")),
            };
            self.advance();
            if *self.current() != Token::Comma {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(scope)
    }

    fn parse_flavor_list(&mut self) -> Result<Flavor> {
        self.expect(&Token::LParen, "'('")?;
        let mut flavor = Flavor::empty();
        loop {
            flavor |= self.expect_flavor()?;
            if *self.current() != Token::Comma {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(flavor)
    }

    fn current_flavor(&self) -> Option<Flavor> {
        let Token::Ident(word) = self.current() else {
            return None;
        };
        let flavor = match word.to_ascii_lowercase().as_str() {
            "enableoverride" => Flavor::ENABLEOVERRIDE,
            "disableoverride" => Flavor::DISABLEOVERRIDE,
            "restricted" => Flavor::RESTRICTED,
            "tosubclass" => Flavor::TOSUBCLASS,
            "toinstance" => Flavor::TOINSTANCE,
            "translatable" => Flavor::TRANSLATABLE,
            _ => return None,
        };
        Some(flavor)
    }

    fn expect_flavor(&mut self) -> Result<Flavor> {
        match self.current_flavor() {
            Some(flavor) => {
                self.advance();
                Ok(flavor)
            }
            None => Err(self.error("expected a flavor")),
        }
    }

    // [Name(value), Name{...} : Flavor Flavor, ...]
    fn parse_qualifier_list(&mut self) -> Result<Vec<QualifierSyntax>> {
        self.expect(&Token::LBracket, "'['")?;
        let mut qualifiers = Vec::new();
        loop {
            qualifiers.push(self.parse_qualifier()?);
            if *self.current() != Token::Comma {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RBracket, "']'")?;
        Ok(qualifiers)
    }

    fn parse_qualifier(&mut self) -> Result<QualifierSyntax> {
        let name = self.expect_name("qualifier name")?;
        let init = match self.current() {
            Token::LParen => {
                self.advance();
                let init = self.parse_initializer()?;
                self.expect(&Token::RParen, "')'")?;
                Some(init)
            }
            Token::LBrace => Some(self.parse_array_initializer()?),
            _ => None,
        };

        let mut flavor = Flavor::empty();
        if *self.current() == Token::Colon {
            self.advance();
            flavor |= self.expect_flavor()?;
            while let Some(f) = self.current_flavor() {
                flavor |= f;
                self.advance();
            }
        }
        Ok(QualifierSyntax { name, init, flavor })
    }

    /// Type each qualifier from its declaration
    fn build_qualifiers(&mut self, syntax: Vec<QualifierSyntax>) -> Result<Vec<Qualifier>> {
        let mut qualifiers = Vec::with_capacity(syntax.len());
        for q in syntax {
            let (value, declared) = self.compiler.qualifier_value(&q.name, q.init.as_ref())?;
            qualifiers.push(Qualifier::new(q.name, value, q.flavor.resolve(declared)));
        }
        Ok(qualifiers)
    }

    fn parse_optional_qualifiers(&mut self) -> Result<Vec<Qualifier>> {
        if *self.current() != Token::LBracket {
            return Ok(Vec::new());
        }
        let syntax = self.parse_qualifier_list()?;
        self.mark();
        self.build_qualifiers(syntax)
    }

    fn parse_array_suffix(&mut self) -> Result<Shape> {
        if *self.current() != Token::LBracket {
            return Ok(Shape::Scalar);
        }
        self.advance();
        let size = match self.current() {
            Token::Integer(text) => {
                let size = parse_integer(text).and_then(|v| u32::try_from(v).ok());
                let Some(size) = size else {
                    return Err(self.error("invalid array size"));
                };
                self.advance();
                size
            }
            _ => 0,
        };
        self.expect(&Token::RBracket, "']'")?;
        Ok(Shape::Array(size))
    }

    fn parse_default_value(&mut self) -> Result<Initializer> {
        if *self.current() != Token::Equals {
            return Ok(Initializer::Null);
        }
        self.advance();
        self.parse_initializer()
    }

    fn parse_initializer(&mut self) -> Result<Initializer> {
        match self.current() {
            Token::Null => {
                self.advance();
                Ok(Initializer::Null)
            }
            Token::LBrace => self.parse_array_initializer(),
            _ => Ok(Initializer::Scalar(self.parse_literal()?)),
        }
    }

    fn parse_array_initializer(&mut self) -> Result<Initializer> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut elements = Vec::new();
        if *self.current() != Token::RBrace {
            loop {
                elements.push(self.parse_literal()?);
                if *self.current() != Token::Comma {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Initializer::Array(elements))
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current().clone() {
            Token::Integer(text) => Literal::Integer(text),
            Token::Real(text) => Literal::Real(text),
            Token::StringLiteral(_) => return Ok(Literal::String(self.expect_string()?)),
            Token::CharLiteral(c) => Literal::Char(c),
            Token::True => Literal::Boolean(true),
            Token::False => Literal::Boolean(false),
            Token::Alias(alias) => {
                self.mark_at(self.pos);
                Literal::Reference(self.compiler.alias_path(&alias)?)
            }
            _ => return Err(self.error("expected a value")),
        };
        self.advance();
        Ok(literal)
    }

    // [quals] class Name : Super { features };
    fn parse_class(&mut self, qualifiers: Vec<QualifierSyntax>) -> Result<()> {
        self.advance(); // Skip 'class'
        let name = self.expect_name("class name")?;
        if *self.current() == Token::As {
            self.advance();
            let alias = self.expect_alias()?;
            self.mark();
            return Err(self.compiler.class_alias(&alias, &name));
        }
        let super_class = if *self.current() == Token::Colon {
            self.advance();
            Some(self.expect_name("superclass name")?)
        } else {
            None
        };

        self.mark();
        let class = Class::new(name, super_class);
        let qualifiers = self.build_qualifiers(qualifiers)?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| class.add_qualifier(q))?;

        self.expect(&Token::LBrace, "'{'")?;
        while !matches!(self.current(), Token::RBrace | Token::Eof) {
            self.parse_feature(&class)?;
        }
        self.expect(&Token::RBrace, "'}'")?;
        self.expect(&Token::Semicolon, "';'")?;
        self.compiler.add_class(class)
    }

    fn parse_feature(&mut self, class: &Class) -> Result<()> {
        let qualifiers = self.parse_optional_qualifiers()?;
        match self.current().clone() {
            Token::DataType(cim_type) => {
                self.advance();
                let name = self.expect_name("property or method name")?;
                if *self.current() == Token::LParen {
                    self.parse_method(class, name, cim_type, qualifiers)
                } else {
                    self.parse_property(class, name, cim_type, qualifiers)
                }
            }
            Token::Ident(reference_class) if *self.peek(1) == Token::Ref => {
                self.advance();
                self.advance();
                let reference_class = CimName::new(&reference_class)
                    .map_err(|_| self.error("invalid reference class name"))?;
                let name = self.expect_name("reference name")?;
                self.parse_reference(class, name, reference_class, qualifiers)
            }
            _ => Err(self.error("expected a property, reference or method")),
        }
    }

    fn parse_property(
        &mut self,
        class: &Class,
        name: CimName,
        cim_type: CimType,
        qualifiers: Vec<Qualifier>,
    ) -> Result<()> {
        let shape = self.parse_array_suffix()?;
        let init = self.parse_default_value()?;
        self.expect(&Token::Semicolon, "';'")?;
        self.mark();

        let value = self.compiler.literal_value(cim_type, shape, &init)?;
        let array_size = match shape {
            Shape::Array(size) => size,
            Shape::Scalar => 0,
        };
        let property_name = name.to_string();
        let property = Property::with_details(name, value, array_size, None, None, false);
        let property = self
            .compiler
            .or_fatal(property, MessageCode::NewPropertyError, &[&property_name])?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| property.add_qualifier(q))?;
        self.compiler.apply_property(class, property)
    }

    fn parse_reference(
        &mut self,
        class: &Class,
        name: CimName,
        reference_class: CimName,
        qualifiers: Vec<Qualifier>,
    ) -> Result<()> {
        let init = self.parse_default_value()?;
        self.expect(&Token::Semicolon, "';'")?;
        self.mark();

        let value = self
            .compiler
            .literal_value(CimType::Reference, Shape::Scalar, &init)?;
        let property_name = name.to_string();
        let property = Property::reference(name, value, reference_class);
        let property = self
            .compiler
            .or_fatal(property, MessageCode::NewPropertyError, &[&property_name])?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| property.add_qualifier(q))?;
        self.compiler.apply_property(class, property)
    }

    // type Name([quals] type param[], [quals] Class REF param);
    fn parse_method(
        &mut self,
        class: &Class,
        name: CimName,
        return_type: CimType,
        qualifiers: Vec<Qualifier>,
    ) -> Result<()> {
        let method = Method::new(name, return_type);
        self.expect(&Token::LParen, "'('")?;
        if *self.current() != Token::RParen {
            loop {
                self.parse_parameter(&method)?;
                if *self.current() != Token::Comma {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&Token::RParen, "')'")?;
        self.expect(&Token::Semicolon, "';'")?;
        self.mark();

        self.compiler
            .apply_qualifiers(qualifiers, |q| method.add_qualifier(q))?;
        self.compiler.apply_method(class, method)
    }

    fn parse_parameter(&mut self, method: &Method) -> Result<()> {
        let qualifiers = self.parse_optional_qualifiers()?;
        let (cim_type, reference_class) = match self.current().clone() {
            Token::DataType(cim_type) => {
                self.advance();
                (cim_type, None)
            }
            Token::Ident(reference_class) if *self.peek(1) == Token::Ref => {
                self.advance();
                self.advance();
                let reference_class = CimName::new(&reference_class)
                    .map_err(|_| self.error("invalid reference class name"))?;
                (CimType::Reference, Some(reference_class))
            }
            _ => return Err(self.error("expected a parameter type")),
        };
        let name = self.expect_name("parameter name")?;
        let shape = self.parse_array_suffix()?;
        self.mark();

        let (is_array, array_size) = match shape {
            Shape::Array(size) => (true, size),
            Shape::Scalar => (false, 0),
        };
        let parameter_name = name.to_string();
        let parameter = Parameter::new(name, cim_type, is_array, array_size, reference_class);
        let parameter = self
            .compiler
            .or_fatal(parameter, MessageCode::NewParameterError, &[&parameter_name])?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| parameter.add_qualifier(q))?;
        self.compiler.apply_parameter(method, parameter)
    }

    // [quals] instance of Class as $Alias { [quals] Prop = value; };
    fn parse_instance(&mut self, qualifiers: Vec<QualifierSyntax>) -> Result<()> {
        self.advance(); // Skip 'instance'
        self.expect(&Token::Of, "'of'")?;
        let class_name = self.expect_name("class name")?;
        let alias = if *self.current() == Token::As {
            self.advance();
            Some(self.expect_alias()?)
        } else {
            None
        };

        self.mark();
        let class = self.compiler.class_for(&class_name)?;
        let instance = Instance::new(class_name);
        let qualifiers = self.build_qualifiers(qualifiers)?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| instance.add_qualifier(q))?;

        self.expect(&Token::LBrace, "'{'")?;
        while !matches!(self.current(), Token::RBrace | Token::Eof) {
            self.parse_instance_property(&class, &instance)?;
        }
        self.expect(&Token::RBrace, "'}'")?;
        self.expect(&Token::Semicolon, "';'")?;

        if let Some(alias) = alias {
            self.mark();
            self.compiler.add_instance_alias(&alias, &instance)?;
        }
        self.compiler.add_instance(instance)
    }

    fn parse_instance_property(&mut self, class: &Class, instance: &Instance) -> Result<()> {
        let qualifiers = self.parse_optional_qualifiers()?;
        let name = self.expect_name("property name")?;
        self.expect(&Token::Equals, "'='")?;
        let init = self.parse_initializer()?;
        self.expect(&Token::Semicolon, "';'")?;
        self.mark();

        let template = self.compiler.property_template(class, &name)?;
        let array_size = template.array_size()?;
        let shape = if init.is_array() || template.is_array()? {
            Shape::Array(array_size)
        } else {
            Shape::Scalar
        };
        let value = self
            .compiler
            .literal_value(template.cim_type()?, shape, &init)?;
        let array_size = if value.is_array() { array_size } else { 0 };

        let property_name = name.to_string();
        let property = Property::with_details(
            name,
            value,
            array_size,
            template.reference_class_name()?,
            None,
            false,
        );
        let property = self
            .compiler
            .or_fatal(property, MessageCode::NewPropertyError, &[&property_name])?;
        self.compiler
            .apply_qualifiers(qualifiers, |q| property.add_qualifier(q))?;
        self.compiler.apply_instance_property(instance, property)
    }
}

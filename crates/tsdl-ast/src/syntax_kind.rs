//! Syntax kinds recognized by the downlevel engine.
//!
//! This is the subset of TypeScript syntax the flag classifier distinguishes,
//! plus the baseline statement/expression kinds the engine synthesizes.
//! Type node kinds are kept contiguous so range checks stay cheap.

/// Kind tag for a [`crate::Node`]. Stored as `u16` in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    Unknown = 0,

    // Modifier and keyword tokens
    PublicKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    AbstractKeyword,
    DeclareKeyword,
    AsyncKeyword,
    ConstKeyword,
    StaticKeyword,
    ExportKeyword,
    DefaultKeyword,
    ExtendsKeyword,
    ImplementsKeyword,
    EqualsToken,
    ThisKeyword,
    SuperKeyword,

    // Type keyword tokens (classified like type nodes, but not contiguous
    // with them; matched explicitly by the classifier)
    AnyKeyword,
    NumberKeyword,
    StringKeyword,
    BooleanKeyword,
    SymbolKeyword,
    VoidKeyword,

    // Names
    Identifier,
    QualifiedName,
    ComputedPropertyName,

    // Literals
    StringLiteral,
    NumericLiteral,
    NoSubstitutionTemplateLiteral,

    // Signature elements
    TypeParameter,
    Parameter,
    Decorator,

    // Type members
    PropertySignature,
    MethodSignature,
    CallSignature,
    ConstructSignature,
    IndexSignature,

    // Type nodes (contiguous: FIRST_TYPE_NODE ..= LAST_TYPE_NODE)
    TypeReference,
    FunctionType,
    ConstructorType,
    TypeLiteral,
    ArrayType,
    TupleType,
    UnionType,
    ParenthesizedType,

    // Expressions
    ArrayLiteralExpression,
    ObjectLiteralExpression,
    PropertyAccessExpression,
    ElementAccessExpression,
    CallExpression,
    NewExpression,
    TaggedTemplateExpression,
    ParenthesizedExpression,
    FunctionExpression,
    ArrowFunction,
    ClassExpression,
    BinaryExpression,
    ConditionalExpression,
    TemplateExpression,
    YieldExpression,
    AwaitExpression,
    SpreadElementExpression,
    ExpressionWithTypeArguments,
    OmittedExpression,

    // Binding patterns
    ObjectBindingPattern,
    ArrayBindingPattern,
    BindingElement,

    // Object literal members
    PropertyAssignment,
    ShorthandPropertyAssignment,

    // Class members
    PropertyDeclaration,
    MethodDeclaration,
    Constructor,
    GetAccessor,
    SetAccessor,

    // Misc
    HeritageClause,
    EnumMember,

    // Statements
    Block,
    VariableStatement,
    EmptyStatement,
    ExpressionStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    ContinueStatement,
    BreakStatement,
    ReturnStatement,
    ThrowStatement,
    TryStatement,

    // Declarations
    FunctionDeclaration,
    ClassDeclaration,
    EnumDeclaration,
    ModuleDeclaration,
    ModuleBlock,
    VariableDeclaration,
    VariableDeclarationList,
    ImportEqualsDeclaration,
    ImportDeclaration,
    ExportDeclaration,
    ExportAssignment,

    // Top level
    SourceFile,
}

impl SyntaxKind {
    pub const FIRST_TYPE_NODE: SyntaxKind = SyntaxKind::TypeReference;
    pub const LAST_TYPE_NODE: SyntaxKind = SyntaxKind::ParenthesizedType;

    /// True for the contiguous type-node range (`TypeReference` through
    /// `ParenthesizedType`). Type keyword tokens are matched separately.
    pub fn is_type_node(self) -> bool {
        let k = self as u16;
        k >= Self::FIRST_TYPE_NODE as u16 && k <= Self::LAST_TYPE_NODE as u16
    }

    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::AnyKeyword
                | SyntaxKind::NumberKeyword
                | SyntaxKind::StringKeyword
                | SyntaxKind::BooleanKeyword
                | SyntaxKind::SymbolKeyword
                | SyntaxKind::VoidKeyword
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::VariableStatement
                | SyntaxKind::EmptyStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForInStatement
                | SyntaxKind::ForOfStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::FunctionDeclaration
                | SyntaxKind::ClassDeclaration
                | SyntaxKind::EnumDeclaration
                | SyntaxKind::ModuleDeclaration
                | SyntaxKind::ImportEqualsDeclaration
                | SyntaxKind::ImportDeclaration
                | SyntaxKind::ExportDeclaration
                | SyntaxKind::ExportAssignment
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::ThisKeyword
                | SyntaxKind::SuperKeyword
                | SyntaxKind::StringLiteral
                | SyntaxKind::NumericLiteral
                | SyntaxKind::NoSubstitutionTemplateLiteral
                | SyntaxKind::ArrayLiteralExpression
                | SyntaxKind::ObjectLiteralExpression
                | SyntaxKind::PropertyAccessExpression
                | SyntaxKind::ElementAccessExpression
                | SyntaxKind::CallExpression
                | SyntaxKind::NewExpression
                | SyntaxKind::TaggedTemplateExpression
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::FunctionExpression
                | SyntaxKind::ArrowFunction
                | SyntaxKind::ClassExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::ConditionalExpression
                | SyntaxKind::TemplateExpression
                | SyntaxKind::YieldExpression
                | SyntaxKind::AwaitExpression
                | SyntaxKind::SpreadElementExpression
                | SyntaxKind::ExpressionWithTypeArguments
                | SyntaxKind::OmittedExpression
        )
    }
}

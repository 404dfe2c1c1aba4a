//! Derive macro for quill table definitions.
//!
//! `#[derive(Table)]` turns a plain struct into a table description whose
//! column accessors return typed `quill_core::Expression`s.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Type};

/// Accessor names generated on the table type, which fields must not shadow.
const RESERVED: &[&str] = &["table_name", "query", "create_table"];

/// Derives table metadata and typed column accessors for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to `snake_case` of struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(primary_key)]` - Marks the field as primary key
/// - `#[column(unique)]` - Marks the column as UNIQUE
/// - `#[column(autoincrement)]` - Marks the column as AUTOINCREMENT (implies primary key)
/// - `#[column(default = ...)]` - Sets a default; a string is taken as raw SQL,
///   numbers and booleans are rendered as literals
///
/// Nullability and the declared column type come from the field type:
/// `Option<T>` columns are nullable, and `T`'s `Value` implementation names
/// the declared type.
///
/// # Generated Items
///
/// For a struct `User`, this macro generates `UserTable`, implementing
/// `Table` and `TableSchema`, with:
///
/// - one accessor per field returning `Expression<FieldType>`
/// - `query()`, a `Query` over the table
/// - `create_table()`, the `CreateTable` built from the schema
///
/// and `User::table()` returning `UserTable`.
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    primary_key: bool,
    unique: bool,
    autoincrement: bool,
    default_expr: Option<String>,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    unique: bool,
    autoincrement: bool,
    default_expr: Option<String>,
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let table_name = get_table_name(&input.attrs, struct_name)?;
    let columns = parse_columns(input)?;

    let table_struct_name = format_ident!("{}Table", struct_name);
    let accessors = columns.iter().map(accessor);
    let schema_entries = columns.iter().map(schema_entry);
    let column_names = columns.iter().map(|c| c.column_name.as_str());

    let primary_key = match columns.iter().find(|c| c.primary_key) {
        Some(pk) => {
            let name = &pk.column_name;
            quote!(Some(#name))
        }
        None => quote!(None),
    };

    let table_doc = format!("Table metadata and typed columns for `{struct_name}`.");

    Ok(quote! {
        #[doc = #table_doc]
        #[derive(Debug, Clone, Copy)]
        #vis struct #table_struct_name;

        impl ::quill_core::schema::Table for #table_struct_name {
            type Row = #struct_name;

            const NAME: &'static str = #table_name;
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            const PRIMARY_KEY: Option<&'static str> = #primary_key;
        }

        impl ::quill_core::schema::TableSchema for #table_struct_name {
            const SCHEMA: &'static [::quill_core::schema::ColumnSchema] = &[
                #(#schema_entries),*
            ];
        }

        impl #table_struct_name {
            /// Returns the table name.
            #[inline]
            #[must_use]
            pub const fn table_name() -> &'static str {
                #table_name
            }

            /// A query over this table.
            pub fn query() -> ::quill_core::Query {
                ::quill_core::Query::table(#table_name)
            }

            /// `CREATE TABLE` for this table's schema.
            pub fn create_table() -> ::quill_core::CreateTable {
                ::quill_core::CreateTable::for_table::<Self>()
            }

            #(#accessors)*
        }

        impl #struct_name {
            /// Returns the table metadata type.
            #[must_use]
            pub const fn table() -> #table_struct_name {
                #table_struct_name
            }
        }
    })
}

/// Collects the column description of every named field.
fn parse_columns(input: &DeriveInput) -> syn::Result<Vec<ColumnInfo>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "Table derive only supports structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Table derive only supports structs with named fields",
        ));
    };

    let mut columns = Vec::new();
    for field in &fields.named {
        let field_name = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        if RESERVED.contains(&field_name.to_string().as_str()) {
            return Err(syn::Error::new_spanned(
                &field_name,
                format!(
                    "field name `{field_name}` collides with a generated table method"
                ),
            ));
        }
        let attrs = parse_column_attrs(&field.attrs)?;
        columns.push(ColumnInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type: field.ty.clone(),
            primary_key: attrs.primary_key || attrs.autoincrement,
            unique: attrs.unique,
            autoincrement: attrs.autoincrement,
            default_expr: attrs.default_expr,
        });
    }

    if columns.iter().filter(|c| c.primary_key).count() > 1 {
        return Err(syn::Error::new_spanned(input, "at most one column may be marked primary_key"));
    }
    Ok(columns)
}

fn accessor(info: &ColumnInfo) -> TokenStream2 {
    let method_name = &info.field_name;
    let field_type = &info.field_type;
    let column_name = &info.column_name;
    let doc = format!("The `{column_name}` column.");
    quote! {
        #[doc = #doc]
        #[must_use]
        pub fn #method_name() -> ::quill_core::Expression<#field_type> {
            ::quill_core::Expression::new(#column_name)
        }
    }
}

fn schema_entry(info: &ColumnInfo) -> TokenStream2 {
    let name = &info.column_name;
    let field_type = &info.field_type;
    let primary_key = info.primary_key;
    let unique = info.unique;
    let autoincrement = info.autoincrement;
    let default_expr = match &info.default_expr {
        Some(expr) => quote!(Some(#expr)),
        None => quote!(None),
    };
    quote! {
        ::quill_core::schema::ColumnSchema {
            name: #name,
            declared_type: <<#field_type as ::quill_core::SqlType>::Base
                as ::quill_core::Value>::DECLARED_DATATYPE,
            nullable: <<#field_type as ::quill_core::SqlType>::Null
                as ::quill_core::Nullability>::NULLABLE,
            primary_key: #primary_key,
            unique: #unique,
            autoincrement: #autoincrement,
            default_expr: #default_expr,
        }
    }
}

fn string_value(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

/// Renders a `default = ...` literal as SQL.
fn default_sql(expr: &Expr) -> syn::Result<String> {
    let rendered = match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            Lit::Int(i) => Some(i.base10_digits().to_string()),
            Lit::Float(f) => Some(f.base10_digits().to_string()),
            Lit::Bool(b) => Some(String::from(if b.value { "1" } else { "0" })),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            let inner = default_sql(&unary.expr)?;
            Some(format!("-{inner}"))
        }
        _ => None,
    };
    rendered.ok_or_else(|| {
        syn::Error::new_spanned(expr, "default must be a string, number or boolean literal")
    })
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    let mut table_name = None;
    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    table_name = Some(string_value(&value).ok_or_else(|| {
                        meta.error("table name must be a string literal")
                    })?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute"))
                }
            })?;
        }
    }
    Ok(table_name.unwrap_or_else(|| to_snake_case(&struct_name.to_string())))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("column") {
            continue;
        }
        // Handle empty attribute like #[column]
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                result.primary_key = true;
            } else if meta.path.is_ident("unique") {
                result.unique = true;
            } else if meta.path.is_ident("autoincrement") {
                result.autoincrement = true;
            } else if meta.path.is_ident("name") {
                let value: Expr = meta.value()?.parse()?;
                result.name = Some(
                    string_value(&value)
                        .ok_or_else(|| meta.error("column name must be a string literal"))?,
                );
            } else if meta.path.is_ident("default") {
                let value: Expr = meta.value()?.parse()?;
                result.default_expr = Some(default_sql(&value)?);
            } else {
                return Err(meta.error("unsupported column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

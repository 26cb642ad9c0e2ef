//! Builtin type ids and the fixed packer table behind them.
//!
//! Ids 1-9 are scalars, 800-808 lists of those scalars, 850-853 maps over
//! {int32, str}², and 998 is the sentinel for a nested heterogeneous map.
//! Every other id belongs to session-supplied custom packers.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::collection::{ListOf, MapOf};
use crate::date::Date;
use crate::packer::PackerRef;
use crate::primitive::{Bool, Float, Int16, Int32, Int64, Int8};
use crate::varlen::{Buffer, Str};

pub const INT8: i32 = 1;
pub const BOOL: i32 = 2;
pub const INT16: i32 = 3;
pub const INT32: i32 = 4;
pub const INT64: i32 = 5;
pub const FLOAT: i32 = 6;
pub const BUFFER: i32 = 7;
pub const DATE: i32 = 8;
pub const STR: i32 = 9;

pub const LIST_OF_INT8: i32 = 800;
pub const LIST_OF_BOOL: i32 = 801;
pub const LIST_OF_INT16: i32 = 802;
pub const LIST_OF_INT32: i32 = 803;
pub const LIST_OF_INT64: i32 = 804;
pub const LIST_OF_FLOAT: i32 = 805;
pub const LIST_OF_BUFFER: i32 = 806;
pub const LIST_OF_DATE: i32 = 807;
pub const LIST_OF_STR: i32 = 808;

pub const MAP_OF_INT32_INT32: i32 = 850;
pub const MAP_OF_INT32_STR: i32 = 851;
pub const MAP_OF_STR_INT32: i32 = 852;
pub const MAP_OF_STR_STR: i32 = 853;

/// Sentinel id: "the heterogeneous-map packer doing the decoding".
pub const HETERO_MAP: i32 = 998;

macro_rules! builtin_packers {
    ($($accessor:ident => $id:ident, $name:literal, $packer:expr;)*) => {
        $(
            #[doc = concat!("The shared builtin `", $name, "` packer.")]
            pub fn $accessor() -> PackerRef {
                static PACKER: LazyLock<PackerRef> = LazyLock::new(|| -> PackerRef {
                    Arc::new($packer)
                });
                Arc::clone(&PACKER)
            }
        )*

        static TABLE: LazyLock<HashMap<i32, (&'static str, PackerRef)>> = LazyLock::new(|| {
            HashMap::from([$(($id, ($name, $accessor()))),*])
        });
    };
}

builtin_packers! {
    int8 => INT8, "int8", Int8;
    boolean => BOOL, "bool", Bool;
    int16 => INT16, "int16", Int16;
    int32 => INT32, "int32", Int32;
    int64 => INT64, "int64", Int64;
    float => FLOAT, "float", Float;
    buffer => BUFFER, "buffer", Buffer;
    date => DATE, "date", Date::new();
    string => STR, "str", Str;
    list_of_int8 => LIST_OF_INT8, "list<int8>", ListOf::new(LIST_OF_INT8, Int8);
    list_of_bool => LIST_OF_BOOL, "list<bool>", ListOf::new(LIST_OF_BOOL, Bool);
    list_of_int16 => LIST_OF_INT16, "list<int16>", ListOf::new(LIST_OF_INT16, Int16);
    list_of_int32 => LIST_OF_INT32, "list<int32>", ListOf::new(LIST_OF_INT32, Int32);
    list_of_int64 => LIST_OF_INT64, "list<int64>", ListOf::new(LIST_OF_INT64, Int64);
    list_of_float => LIST_OF_FLOAT, "list<float>", ListOf::new(LIST_OF_FLOAT, Float);
    list_of_buffer => LIST_OF_BUFFER, "list<buffer>", ListOf::new(LIST_OF_BUFFER, Buffer);
    list_of_date => LIST_OF_DATE, "list<date>", ListOf::new(LIST_OF_DATE, Date::new());
    list_of_str => LIST_OF_STR, "list<str>", ListOf::new(LIST_OF_STR, Str);
    map_of_int32_int32 => MAP_OF_INT32_INT32, "map<int32,int32>",
        MapOf::new(MAP_OF_INT32_INT32, Int32, Int32);
    map_of_int32_str => MAP_OF_INT32_STR, "map<int32,str>",
        MapOf::new(MAP_OF_INT32_STR, Int32, Str);
    map_of_str_int32 => MAP_OF_STR_INT32, "map<str,int32>",
        MapOf::new(MAP_OF_STR_INT32, Str, Int32);
    map_of_str_str => MAP_OF_STR_STR, "map<str,str>",
        MapOf::new(MAP_OF_STR_STR, Str, Str);
}

/// Look up a builtin packer. The sentinel is not in this table.
pub fn get(id: i32) -> Option<PackerRef> {
    TABLE.get(&id).map(|(_, packer)| Arc::clone(packer))
}

/// Human-readable name of a builtin id, including the sentinel.
pub fn name(id: i32) -> Option<&'static str> {
    if id == HETERO_MAP {
        return Some("heteromap");
    }
    TABLE.get(&id).map(|(name, _)| *name)
}

/// All builtin ids with a packer in the table, ascending.
pub fn ids() -> Vec<i32> {
    let mut ids: Vec<i32> = TABLE.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// `true` for every id custom packers may not claim.
pub fn is_reserved(id: i32) -> bool {
    id == HETERO_MAP || TABLE.contains_key(&id)
}

//! Standard declarations every program can refer to.
//!
//! Written in the declaration language itself and run through the same
//! front end as user code, so the collector has a single input path.

pub const SOURCE: &str = r#"
struct Int {}
struct Float {}
struct Bool {}
struct String {}

struct Optional<Wrapped> {}

struct Range<Bound> {
    let lowerBound: Bound
    let upperBound: Bound
}

struct ArraySlice<Element> {
    var count: Int { get }
    subscript(index: Int) -> Element { get set }
}

struct Array<Element> {
    var count: Int { get }
    subscript(index: Int) -> Element { get set }
    subscript(bounds: Range<Int>) -> ArraySlice<Element> { get set }
}

struct Dictionary<Key, Value> {
    var count: Int { get }
    subscript(key: Key) -> Optional<Value> { get set }
}
"#;

/// Names the checker looks up for literal and range expressions.
pub const INT: &str = "Int";
pub const FLOAT: &str = "Float";
pub const BOOL: &str = "Bool";
pub const STRING: &str = "String";
pub const OPTIONAL: &str = "Optional";
pub const RANGE: &str = "Range";
pub const ARRAY: &str = "Array";
pub const DICTIONARY: &str = "Dictionary";

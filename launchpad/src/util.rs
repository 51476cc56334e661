/// Builds a `Vec<String>` out of anything that implements `ToString`.
#[macro_export]
macro_rules! args {
    ($($element:expr),*) => {{
        #[allow(unused_mut)]
        let mut vs: Vec<String> = Vec::new();
        $(vs.push($element.to_string());)*
        vs
    }};
    ($($element:expr,)*) => {{
        $crate::args![$($element),*]
    }};
}

/// Splits a program given as a single string (e.g. `"java -cp ~/bin App"`)
/// into its words.
pub fn words(program: &str) -> Vec<String> {
    program.split_whitespace().map(String::from).collect()
}

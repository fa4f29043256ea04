pub fn is_false(v: &bool) -> bool {
    !v
}

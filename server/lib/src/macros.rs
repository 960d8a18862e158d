#[cfg(test)]
macro_rules! entry_init {
    ($dn:expr $(, ($attr:expr, $($value:expr),+ $(,)?))* $(,)?) => {{
        #[allow(unused_mut)]
        let mut e = $crate::entry::Entry::new(
            $dn.parse::<$crate::dn::Dn>().expect("invalid test dn"),
        );
        $(
            let mut scratch = Vec::new();
            e.add_attribute(
                $crate::entry::Attribute::new($attr, vec![$($value.to_string()),+]),
                &mut scratch,
            );
        )*
        e
    }};
}

#[cfg(test)]
macro_rules! modlist {
    ($($m:expr),* $(,)?) => {{
        let mut ml = $crate::modify::ModifyList::new();
        $( ml.push($m); )*
        ml
    }};
}

//! Catalog page fixtures shared by the crawler tests

pub(crate) const BASE: &str = "https://books.example.com/";

/// URL the walker requests for listing page `page`
pub(crate) fn page_url(page: u32) -> String {
    if page <= 1 {
        BASE.to_string()
    } else {
        format!("{}catalogue/page-{}.html", BASE, page)
    }
}

pub(crate) fn detail_url(page: u32, index: usize) -> String {
    format!("{}catalogue/book-{}-{}/index.html", BASE, page, index)
}

/// A listing page holding `count` books titled `Book {page}-{i}`
pub(crate) fn listing_html(page: u32, count: usize, next: bool) -> String {
    let entries: String = (1..=count)
        .map(|i| {
            format!(
                r#"<li><article class="product_pod">
                    <div class="image_container">
                        <a href="/catalogue/book-{page}-{i}/index.html"><img src="/media/cache/{page}-{i}.jpg"></a>
                    </div>
                    <p class="star-rating Four"></p>
                    <h3><a href="/catalogue/book-{page}-{i}/index.html" title="Book {page}-{i}">Book {page}-{i}</a></h3>
                    <p class="instock availability">In stock</p>
                </article></li>"#
            )
        })
        .collect();

    let pager = if next {
        format!(
            r#"<ul class="pager"><li class="next"><a href="page-{}.html">next</a></li></ul>"#,
            page + 1
        )
    } else {
        String::new()
    };

    format!(
        r#"<html><body><section><ol class="row">{}</ol>{}</section></body></html>"#,
        entries, pager
    )
}

pub(crate) fn detail_html(author: &str, year: i32) -> String {
    format!(
        r#"<html><body><article class="product_page">
            <div class="product_main">
                <h1>Some Book</h1>
                <p class="author"><a href="/authors/x">{author}</a></p>
                <p class="publish-year">Published {year}</p>
            </div>
        </article></body></html>"#
    )
}

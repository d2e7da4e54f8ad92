use crate::canvas::PageCanvas;
use crate::error::RenderError;
use crate::fonts::StandardFont;
use crate::raster::LoadedImage;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use statement_types::Size;
use std::io::Write;

/// Builds an in-memory PDF from finished page canvases.
///
/// All pages share one resources dictionary holding the standard fonts and any
/// registered images. Object ids are allocated in call order, so the same
/// sequence of calls always produces the same bytes.
pub struct PdfDocumentBuilder {
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    images: Vec<(String, ObjectId)>,
    title: String,
    compress: bool,
}

impl PdfDocumentBuilder {
    pub fn new(title: &str) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let resources_id = document.new_object_id();
        Self {
            document,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            images: Vec::new(),
            title: title.to_string(),
            compress: true,
        }
    }

    /// Flate-compress content and image streams (on by default).
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn stream(&self, dict: Dictionary, data: Vec<u8>) -> Result<Stream, RenderError> {
        if !self.compress {
            return Ok(Stream::new(dict, data));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data)?;
        let compressed = encoder.finish()?;
        let mut dict = dict;
        dict.set("Filter", "FlateDecode");
        Ok(Stream::new(dict, compressed))
    }

    /// Registers an image XObject and returns the resource name to draw it with.
    pub fn add_image(&mut self, image: &LoadedImage) -> Result<String, RenderError> {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };
        let stream = self.stream(dict, image.rgb.clone())?;
        let id = self.document.add_object(stream);
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push((name.clone(), id));
        Ok(name)
    }

    pub fn add_page(&mut self, size: Size, canvas: PageCanvas) -> Result<(), RenderError> {
        let content = canvas.finish().encode()?;
        let stream = self.stream(dictionary! {}, content)?;
        let content_id = self.document.add_object(stream);

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), size.width.into(), size.height.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        };
        let page_id = self.document.add_object(page_dict);
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Writes the shared resources, page tree and catalog, then serializes.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        if self.page_ids.is_empty() {
            return Err(RenderError::Other("document has no pages".into()));
        }

        let mut fonts = Dictionary::new();
        for font in StandardFont::ALL {
            let font_id = self.document.add_object(font.dictionary());
            fonts.set(font.resource_name(), font_id);
        }
        let mut resources = dictionary! { "Font" => fonts };
        if !self.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in &self.images {
                xobjects.set(name.as_str(), *id);
            }
            resources.set("XObject", xobjects);
        }
        self.document
            .objects
            .insert(self.resources_id, Object::Dictionary(resources));

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::String(self.title.as_bytes().to_vec(), StringFormat::Literal),
            "Producer" => Object::String(b"statement-mailer".to_vec(), StringFormat::Literal),
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }
}
